//! TableSync: declarative table reconciliation for MySQL
//!
//! A component declares the tables it owns as plain data (table name, field
//! name, field attributes). TableSync introspects what the database currently
//! holds, works out the column-level DDL that closes the gap, and applies it
//! one statement at a time.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;

use std::collections::HashSet;
use std::sync::Arc;

// Re-export main types for easier access
pub use config::Config;
pub use db::{DatabaseConnection, DdlExecutor, SchemaStore, SqlExecutor};
pub use error::{Error, Result};
pub use schema::analyzer::SchemaAnalyzer;
pub use schema::diff::{DdlIntent, TableDiff};
pub use schema::generator::DdlGenerator;
pub use schema::types::{DeclaredSchema, FieldAttributes, FieldSpec, IndexName, TableDefinition};

use utils::naming::unquote;

/// Initialize TableSync with the specified configuration file
pub async fn init(config_path: &str) -> Result<TableSync> {
    let config = config::load_from_file(config_path)?;
    TableSync::connect(config).await
}

/// The main client: reconciles declared tables against a store
pub struct TableSync {
    config: Config,
    store: Arc<dyn SchemaStore>,
    executor: Arc<dyn DdlExecutor>,
    analyzer: SchemaAnalyzer,
}

impl TableSync {
    /// Connect to MySQL and use it as both store and executor
    pub async fn connect(config: Config) -> Result<Self> {
        let connection = DatabaseConnection::connect(&config.database).await?;
        let executor = SqlExecutor::new(connection.clone(), &config)?;

        Ok(Self::with_store(
            config,
            Arc::new(connection),
            Arc::new(executor),
        ))
    }

    /// Build a client over any store and executor
    pub fn with_store(
        config: Config,
        store: Arc<dyn SchemaStore>,
        executor: Arc<dyn DdlExecutor>,
    ) -> Self {
        let analyzer = SchemaAnalyzer::new(store.clone());

        Self {
            config,
            store,
            executor,
            analyzer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a table back as a declaration. `None` if it does not exist.
    pub async fn introspect(&self, table: &str) -> Result<Option<TableDefinition>> {
        self.analyzer.introspect(table).await
    }

    /// Work out the intents for one table without applying them
    pub async fn plan(&self, declared: &TableDefinition) -> Result<TableDiff> {
        self.check_primary_key(declared)?;

        let current = self.introspect(&declared.name).await?;
        let physical = match &current {
            Some(_) => self.physical_fields(declared).await?,
            None => HashSet::new(),
        };

        let diff = TableDiff::generate(declared, current.as_ref(), &physical);
        tracing::debug!(table = %declared.name, intents = diff.len(), "Planned table");

        Ok(diff)
    }

    /// Reconcile one table and apply the result in order. The first failing
    /// intent aborts the rest; whatever already ran stays applied.
    pub async fn reconcile_and_apply(&self, declared: &TableDefinition) -> Result<()> {
        let diff = self.plan(declared).await?;

        if diff.is_empty() {
            tracing::info!(table = %declared.name, "Table is already in sync");
            return Ok(());
        }

        for (position, intent) in diff.intents.iter().enumerate() {
            tracing::info!(table = %declared.name, intent = %intent, "Applying");

            if let Err(e) = self.executor.apply(intent).await {
                tracing::error!(
                    table = %declared.name,
                    intent = %intent,
                    applied = position,
                    remaining = diff.len() - position - 1,
                    error = %e,
                    "Intent failed, stopping"
                );
                return Err(e);
            }
        }

        tracing::info!(table = %declared.name, intents = diff.len(), "Table reconciled");
        Ok(())
    }

    /// Reconcile every table in declaration order, stopping at the first
    /// table that fails
    pub async fn reconcile_and_apply_all(&self, schema: &DeclaredSchema) -> Result<()> {
        for table in schema.tables() {
            self.reconcile_and_apply(table).await?;
        }

        Ok(())
    }

    fn check_primary_key(&self, declared: &TableDefinition) -> Result<()> {
        if !self.config.reconcile.strict_primary_key {
            return Ok(());
        }

        let fields = declared.primary_key_fields();
        if fields.len() > 1 {
            return Err(Error::AmbiguousPrimaryKey {
                table: declared.name.clone(),
                fields: fields.into_iter().map(str::to_string).collect(),
            });
        }

        Ok(())
    }

    /// Declared fields the store confirms are on the table right now
    async fn physical_fields(&self, declared: &TableDefinition) -> Result<HashSet<String>> {
        let mut physical = HashSet::new();

        for (field, _) in declared.fields() {
            if self.store.column_exists(&declared.name, unquote(field)).await? {
                physical.insert(field.to_string());
            }
        }

        Ok(physical)
    }
}
