//! Remote data source for the hero catalog.
//!
//! `HeroSource` is the trait the entity store talks to. `HeroApiClient` is the
//! REST implementation used in production; tests substitute scripted sources.

pub mod client;
pub mod error;
pub mod source;

pub use client::HeroApiClient;
pub use error::{ApiError, ErrorClass};
pub use source::HeroSource;
