//! SQL executor
//!
//! Renders each intent with the DDL generator and runs it on the
//! connection, one statement at a time.

use async_trait::async_trait;

use crate::config::Config;
use crate::db::connection::DatabaseConnection;
use crate::db::journal::Journal;
use crate::db::store::DdlExecutor;
use crate::error::Result;
use crate::schema::diff::NewTable;
use crate::schema::generator::DdlGenerator;
use crate::schema::types::FieldAttributes;

/// Executes DDL against a MySQL connection
pub struct SqlExecutor {
    connection: DatabaseConnection,
    generator: DdlGenerator,
    dry_run: bool,
    journal: Option<Journal>,
}

impl SqlExecutor {
    /// Create a new SQL executor
    pub fn new(connection: DatabaseConnection, config: &Config) -> Result<Self> {
        let journal = match &config.output {
            Some(output) => Some(Journal::new(&output.directory)?),
            None => None,
        };

        Ok(Self {
            connection,
            generator: DdlGenerator::new(config),
            dry_run: config.reconcile.dry_run,
            journal,
        })
    }

    /// Execute a single SQL statement
    async fn execute(&self, table: &str, sql: String) -> Result<()> {
        if self.dry_run {
            tracing::info!(table, sql = %sql, "DDL (dry run)");
        } else {
            tracing::debug!(table, sql = %sql, "Executing DDL");
            self.connection.execute(&sql).await?;
        }

        if let Some(journal) = &self.journal {
            journal.record(table, &sql)?;
        }

        Ok(())
    }

    /// Get database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

#[async_trait]
impl DdlExecutor for SqlExecutor {
    async fn create_table(&self, table: &NewTable) -> Result<()> {
        self.execute(&table.name, self.generator.create_table_sql(table))
            .await
    }

    async fn add_column(
        &self,
        table: &str,
        field: &str,
        attributes: &FieldAttributes,
    ) -> Result<()> {
        let sql = self.generator.add_column_sql(table, field, attributes);
        self.execute(table, sql).await
    }

    async fn modify_column(
        &self,
        table: &str,
        field: &str,
        attributes: &FieldAttributes,
    ) -> Result<()> {
        let sql = self.generator.modify_column_sql(table, field, attributes);
        self.execute(table, sql).await
    }

    async fn drop_column(&self, table: &str, field: &str) -> Result<()> {
        let sql = self.generator.drop_column_sql(table, field);
        self.execute(table, sql).await
    }

    async fn create_index(&self, table: &str, field: &str, index_name: &str) -> Result<()> {
        let sql = self.generator.create_index_sql(table, field, index_name);
        self.execute(table, sql).await
    }
}
