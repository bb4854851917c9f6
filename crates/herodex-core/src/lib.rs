//! Core library for herodex.
//!
//! - `models`: `Hero` and the canonical `HeroesPage`
//! - `api`: the `HeroSource` seam and its REST implementation
//! - `cache`: the persistent single-snapshot cache
//! - `store`: the reactive entity store driving both
//! - `config`: configuration loading

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiError, ErrorClass, HeroApiClient, HeroSource};
pub use cache::{FileStore, HeroCache, KeyValueStore, MemoryStore};
pub use config::{Config, Pagination};
pub use models::{Hero, HeroesPage};
pub use store::{ErrorKind, HeroStore, StoreError, StoreState};
