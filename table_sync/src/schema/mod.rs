//! Schema module for TableSync
//!
//! This module handles table introspection, reconciliation and DDL generation.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod parser;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use diff::{Attribute, DdlIntent, NewTable, TableDiff};
pub use generator::DdlGenerator;
pub use parser::{parse_type, TypeDescriptor};
pub use types::{
    DeclaredSchema, FieldAttributes, FieldSpec, IndexDescriptor, IndexName, TableDefinition,
};
