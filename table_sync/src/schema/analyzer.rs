//! Table introspection
//!
//! Reads a table's columns and indexes back from the store and expresses
//! them in the same shape a component uses to declare a table, so the two
//! can be compared attribute by attribute.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::store::{ColumnKey, ColumnRow, IndexRow, SchemaStore};
use crate::error::Result;
use crate::schema::parser::parse_type;
use crate::schema::types::{FieldAttributes, IndexDescriptor, IndexName, TableDefinition};

const PRIMARY_INDEX: &str = "PRIMARY";
const AUTO_INCREMENT: &str = "auto_increment";

/// Schema analyzer for table introspection
pub struct SchemaAnalyzer {
    store: Arc<dyn SchemaStore>,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self { store }
    }

    /// Introspect one table. `None` means the table does not exist.
    pub async fn introspect(&self, table: &str) -> Result<Option<TableDefinition>> {
        if !self.store.table_exists(table).await? {
            tracing::debug!(table, "Table does not exist");
            return Ok(None);
        }

        let indexes = self.store.indexes(table).await?;
        let columns = self.store.columns(table).await?;

        tracing::debug!(
            table,
            columns = columns.len(),
            index_columns = indexes.len(),
            "Introspected table"
        );

        Ok(Some(Self::assemble(table, &columns, &indexes)))
    }

    /// Map each column to the non-primary index covering it.
    ///
    /// An index named after the only column it covers is recorded as
    /// [`IndexName::SameAsField`], matching the `index = true` shorthand.
    pub fn index_descriptor(rows: &[IndexRow]) -> IndexDescriptor {
        let mut widths: HashMap<&str, usize> = HashMap::new();
        for row in rows {
            *widths.entry(row.index_name.as_str()).or_default() += 1;
        }

        let mut descriptor = IndexDescriptor::new();
        for row in rows.iter().filter(|row| row.index_name != PRIMARY_INDEX) {
            let sole_column = widths.get(row.index_name.as_str()) == Some(&1);
            let index = if sole_column && row.index_name == row.column_name {
                IndexName::SameAsField
            } else {
                IndexName::Named(row.index_name.clone())
            };
            descriptor.insert(&row.column_name, index);
        }

        descriptor
    }

    /// Build a table definition from raw column and index rows. Reserved
    /// column names end up backticked, like in a declaration.
    pub fn assemble(table: &str, columns: &[ColumnRow], indexes: &[IndexRow]) -> TableDefinition {
        let indexes = Self::index_descriptor(indexes);
        let mut definition = TableDefinition::new(table);

        for column in columns {
            definition.insert(&column.name, Self::field_attributes(column, &indexes));
        }

        definition
    }

    fn field_attributes(column: &ColumnRow, indexes: &IndexDescriptor) -> FieldAttributes {
        let parsed = parse_type(&column.column_type);

        FieldAttributes {
            field_type: parsed.field_type,
            constraint: parsed.constraint,
            unsigned: parsed.unsigned,
            nullable: column.nullable,
            default: column.default.clone(),
            auto_increment: column.extra.contains(AUTO_INCREMENT),
            key: matches!(column.key, ColumnKey::Unique | ColumnKey::Multiple),
            primary_key: column.key == ColumnKey::Primary,
            index: indexes.get(&column.name).cloned(),
        }
    }
}
