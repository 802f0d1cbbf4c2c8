//! Store interfaces
//!
//! The query side the introspector reads from and the mutation side the
//! reconciled intents are applied through. Both are passed in explicitly;
//! nothing in the crate reaches for a global handle.

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::diff::{DdlIntent, NewTable};
use crate::schema::types::FieldAttributes;

/// How the store classifies a column's participation in keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    None,
    Primary,
    Unique,
    Multiple,
}

impl ColumnKey {
    /// Map the `COLUMN_KEY` text (`PRI`, `UNI`, `MUL` or empty)
    pub fn from_code(code: &str) -> Self {
        match code {
            "" => ColumnKey::None,
            "PRI" => ColumnKey::Primary,
            "UNI" => ColumnKey::Unique,
            _ => ColumnKey::Multiple,
        }
    }
}

/// One physical column as the store reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub extra: String,
    pub key: ColumnKey,
    pub default: Option<String>,
}

/// One (index, column) pair as the store reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub index_name: String,
    pub column_name: String,
}

/// Read access to the physical schema. Table names are unprefixed.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// `column` is the bare column name, without backticks
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    /// Columns in ordinal order
    async fn columns(&self, table: &str) -> Result<Vec<ColumnRow>>;

    async fn indexes(&self, table: &str) -> Result<Vec<IndexRow>>;
}

/// Applies schema changes. Each call is expected to complete (or fail)
/// before the next one is made.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    async fn create_table(&self, table: &NewTable) -> Result<()>;

    async fn add_column(&self, table: &str, field: &str, attributes: &FieldAttributes)
        -> Result<()>;

    async fn modify_column(
        &self,
        table: &str,
        field: &str,
        attributes: &FieldAttributes,
    ) -> Result<()>;

    async fn drop_column(&self, table: &str, field: &str) -> Result<()>;

    async fn create_index(&self, table: &str, field: &str, index_name: &str) -> Result<()>;

    /// Apply a single intent
    async fn apply(&self, intent: &DdlIntent) -> Result<()> {
        match intent {
            DdlIntent::CreateTable(table) => self.create_table(table).await,
            DdlIntent::AddColumn {
                table,
                field,
                attributes,
            } => self.add_column(table, field, attributes).await,
            DdlIntent::ModifyColumn {
                table,
                field,
                attributes,
            } => self.modify_column(table, field, attributes).await,
            DdlIntent::DropColumn { table, field } => self.drop_column(table, field).await,
            DdlIntent::CreateIndex { table, field, name } => {
                self.create_index(table, field, name).await
            }
        }
    }
}
