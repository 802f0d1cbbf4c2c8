//! Database module for TableSync
//!
//! The store and executor interfaces plus their MySQL implementations.

pub mod connection;
pub mod executor;
pub mod journal;
pub mod store;

// Re-export key types
pub use connection::DatabaseConnection;
pub use executor::SqlExecutor;
pub use journal::Journal;
pub use store::{ColumnKey, ColumnRow, DdlExecutor, IndexRow, SchemaStore};
