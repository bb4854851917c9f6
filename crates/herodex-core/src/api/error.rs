use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse status classification of a remote failure.
///
/// The core never turns this into display text; UI code decides what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    BadRequest,
    Server,
    Transport,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(truncated),
            // The hero API has no auth; a proxy refusing the call is still a rejected request
            401 | 403 => ApiError::BadRequest(format!("Status {}: {}", status, truncated)),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn status_class(&self) -> ErrorClass {
        match self {
            ApiError::NotFound(_) => ErrorClass::NotFound,
            ApiError::BadRequest(_) => ErrorClass::BadRequest,
            ApiError::RateLimited | ApiError::ServerError(_) => ErrorClass::Server,
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => ErrorClass::Transport,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_class() == ErrorClass::NotFound
    }
}
