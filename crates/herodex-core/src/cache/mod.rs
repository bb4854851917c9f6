//! Persistent cache for offline-friendly pagination.
//!
//! `HeroCache` keeps one `{ items, totalCount }` snapshot under a single
//! well-known key on top of a `KeyValueStore` medium:
//! - `FileStore`: JSON files in the cache directory
//! - `MemoryStore`: process-local map

pub mod manager;
pub mod storage;

pub use manager::{HeroCache, HEROES_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
