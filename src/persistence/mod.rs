//! Persistence is made of the following components
//! - Schema (field types, key constraints and cell values)
//! - Field (one typed, constrained column of values)
//! - Table (named fields kept row aligned)
//! - Database (named tables)
//! - Registry (named databases, the selection, commit and rollback)
//! - Codec (the obfuscated snapshot file)
//!

//  All modules of this lib
mod codec;
mod database;
mod field;
mod registry;
mod row;
mod schema;
mod table;

//  External API
pub use codec::{obfuscate, read_snapshot, reveal, write_snapshot};
pub use database::Database;
pub use field::Field;
pub use registry::DatabaseRegistry;
pub use row::{Row, RowFormat};
pub use schema::{DataType, FieldKey, Value};
pub use table::{Assignments, Projection, SortOrder, Table};
