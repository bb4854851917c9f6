//! The remote data source seam consumed by the entity store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Hero, HeroesPage};

use super::ApiError;

/// Logical operations the store needs from the remote collection.
///
/// A missing resource must be reported as `ApiError::NotFound`, never as an
/// empty success.
#[async_trait]
pub trait HeroSource: Send + Sync {
    async fn list_paginated(&self, page: u32, limit: u32) -> Result<HeroesPage, ApiError>;

    async fn list_by_names(&self, names: &[String]) -> Result<HeroesPage, ApiError>;

    async fn get_by_id(&self, id: i64) -> Result<Hero, ApiError>;

    async fn get_by_name(&self, name: &str) -> Result<Hero, ApiError>;

    async fn search(&self, query: &str) -> Result<Vec<Hero>, ApiError>;

    /// Create a hero. Any id on the candidate is ignored; the returned hero
    /// carries the server-assigned id.
    async fn create(&self, hero: &Hero) -> Result<Hero, ApiError>;

    async fn update(&self, hero: &Hero) -> Result<Hero, ApiError>;

    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: HeroSource + ?Sized> HeroSource for Arc<T> {
    async fn list_paginated(&self, page: u32, limit: u32) -> Result<HeroesPage, ApiError> {
        (**self).list_paginated(page, limit).await
    }

    async fn list_by_names(&self, names: &[String]) -> Result<HeroesPage, ApiError> {
        (**self).list_by_names(names).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Hero, ApiError> {
        (**self).get_by_id(id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Hero, ApiError> {
        (**self).get_by_name(name).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Hero>, ApiError> {
        (**self).search(query).await
    }

    async fn create(&self, hero: &Hero) -> Result<Hero, ApiError> {
        (**self).create(hero).await
    }

    async fn update(&self, hero: &Hero) -> Result<Hero, ApiError> {
        (**self).update(hero).await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        (**self).delete(id).await
    }
}
