//! recomenda-core: data model for the Recomenda catalog recommender.
//!
//! This crate provides the read-only records the recommendation engine
//! consumes from its collaborators (catalog, user directory, rating log):
//! - Typed identifiers for items and users
//! - Items with a closed attribute model and derived content text
//! - Users, ratings, interactions
//! - `CatalogSnapshot`, the unit of input for one recommendation request

pub mod types;

pub use types::*;
