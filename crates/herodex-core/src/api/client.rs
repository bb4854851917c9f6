//! REST client for the superhero API.
//!
//! This module provides `HeroApiClient`, the production `HeroSource`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{Config, Pagination};
use crate::models::{Hero, HeroesPage};

use super::{ApiError, HeroSource};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the superhero REST service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HeroApiClient {
    client: Client,
    base_url: String,
    /// Page size sent with by-names lookups
    names_limit: u32,
}

impl HeroApiClient {
    /// Create a client from application configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_base_url(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
            config.default_limit,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        names_limit: u32,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            names_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Request builders =====

    fn list_request(&self, page: u32, limit: u32) -> RequestBuilder {
        self.client
            .get(self.url("/superheroes/pagination"))
            .query(&[("page", page), ("limit", limit)])
    }

    fn by_names_request(&self, names: &[String]) -> RequestBuilder {
        let page = Pagination::DEFAULT_PAGE.to_string();
        let limit = self.names_limit.to_string();
        self.client.get(self.url("/superheroes/by-names")).query(&[
            ("name", names.join(",")),
            ("page", page),
            ("limit", limit),
        ])
    }

    fn by_id_request(&self, id: i64) -> RequestBuilder {
        self.client.get(self.url(&format!("/superheroes/hero/{}", id)))
    }

    fn by_name_request(&self, name: &str) -> RequestBuilder {
        self.client
            .get(self.url("/superheroes/hero"))
            .query(&[("name", name)])
    }

    fn search_request(&self, query: &str) -> RequestBuilder {
        self.client
            .get(self.url("/superheroes/search"))
            .query(&[("name", query)])
    }

    fn create_request(&self, hero: &Hero) -> RequestBuilder {
        let body = Hero {
            id: None,
            ..hero.clone()
        };
        self.client.post(self.url("/superheroes")).json(&body)
    }

    fn update_request(&self, id: i64, hero: &Hero) -> RequestBuilder {
        self.client
            .put(self.url(&format!("/superheroes/{}", id)))
            .json(hero)
    }

    fn delete_request(&self, id: i64) -> RequestBuilder {
        self.client.delete(self.url(&format!("/superheroes/{}", id)))
    }

    // ===== Transport =====

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let request = build().build()?;
            let url = request.url().to_string();
            debug!(method = %request.method(), url = %url, "Sending request");

            let response = self.client.execute(request).await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(build).await?;
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl HeroSource for HeroApiClient {
    async fn list_paginated(&self, page: u32, limit: u32) -> Result<HeroesPage, ApiError> {
        self.send_json(|| self.list_request(page, limit)).await
    }

    async fn list_by_names(&self, names: &[String]) -> Result<HeroesPage, ApiError> {
        self.send_json(|| self.by_names_request(names)).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Hero, ApiError> {
        self.send_json(|| self.by_id_request(id)).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Hero, ApiError> {
        self.send_json(|| self.by_name_request(name)).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Hero>, ApiError> {
        self.send_json(|| self.search_request(query)).await
    }

    async fn create(&self, hero: &Hero) -> Result<Hero, ApiError> {
        self.send_json(|| self.create_request(hero)).await
    }

    async fn update(&self, hero: &Hero) -> Result<Hero, ApiError> {
        let id = hero
            .id
            .ok_or_else(|| ApiError::BadRequest("hero id is required for update".to_string()))?;
        self.send_json(|| self.update_request(id, hero)).await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.send(|| self.delete_request(id)).await?;
        Ok(())
    }
}
