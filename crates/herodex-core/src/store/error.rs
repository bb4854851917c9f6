use thiserror::Error;

use crate::api::ApiError;

use super::state::ErrorKind;

/// Fixed, UI-facing failure messages. Raw transport detail only goes to the log.
pub mod messages {
    pub const FETCH_HEROES: &str = "Error fetching heroes";
    pub const FETCH_BY_NAMES: &str = "Error fetching heroes by names";
    pub const NO_NAMES: &str = "No heroes selected";
    pub const FETCH_HERO: &str = "Error fetching hero";
    pub const HERO_NOT_FOUND: &str = "Hero not found";
    pub const CREATE_HERO: &str = "Error creating hero";
    pub const UPDATE_HERO: &str = "Error updating hero";
    pub const UPDATE_MISSING_ID: &str = "Hero id is required for update";
    pub const DELETE_HERO: &str = "Error deleting hero";
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("hero id is required")]
    MissingId,

    #[error("no hero names given")]
    NoNames,

    #[error("hero not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MissingId | StoreError::NoNames => ErrorKind::Validation,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Remote(e) if e.is_not_found() => ErrorKind::NotFound,
            StoreError::Remote(_) | StoreError::InvalidResponse(_) => ErrorKind::Remote,
        }
    }
}
