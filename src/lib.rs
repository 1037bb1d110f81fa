//! Ferrite is an embedded, column oriented record store.
//!
//! A [`persistence::DatabaseRegistry`] owns databases, a database owns
//! tables and a table owns typed, constrained fields. The whole registry is
//! committed to and rolled back from a single snapshot file.

pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;
pub mod sessions;

pub use error::{EntityKind, StoreError, StoreResult};
