//! Data models for the hero catalog.
//!
//! - `Hero`: one catalog record
//! - `HeroesPage`: a page slice plus the total count across the whole collection

pub mod hero;

pub use hero::{Hero, HeroesPage};
