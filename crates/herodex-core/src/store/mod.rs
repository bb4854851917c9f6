//! Reactive hero store.
//!
//! `HeroStore` owns `StoreState` and coordinates the remote source with the
//! persistent cache. UI code calls its async operations and observes state
//! through `snapshot()` or `subscribe()`.

pub mod error;
pub mod hero_store;
pub mod state;

pub use error::{messages, StoreError};
pub use hero_store::HeroStore;
pub use state::{ErrorKind, StoreState};
