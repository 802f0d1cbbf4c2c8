//! Utilities for TableSync
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{field_key, is_reserved, prefixed_table, quote_identifier, unquote};
