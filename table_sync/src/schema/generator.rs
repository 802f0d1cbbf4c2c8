//! DDL generator
//!
//! Renders reconciled intents as MySQL statements.

use crate::config::{Config, ReconcileConfig};
use crate::schema::diff::{DdlIntent, NewTable};
use crate::schema::types::FieldAttributes;
use crate::utils::naming::{prefixed_table, quote_identifier};

/// MySQL DDL generator
#[derive(Debug, Clone)]
pub struct DdlGenerator {
    table_prefix: String,
    charset: String,
    collation: String,
}

impl DdlGenerator {
    /// Create a new generator from configuration
    pub fn new(config: &Config) -> Self {
        Self::with_options(&config.database.table_prefix, &config.reconcile)
    }

    pub fn with_options(table_prefix: &str, reconcile: &ReconcileConfig) -> Self {
        Self {
            table_prefix: table_prefix.to_string(),
            charset: reconcile.charset.clone(),
            collation: reconcile.collation.clone(),
        }
    }

    /// Render one intent as a single statement
    pub fn generate(&self, intent: &DdlIntent) -> String {
        match intent {
            DdlIntent::CreateTable(table) => self.create_table_sql(table),
            DdlIntent::AddColumn {
                table,
                field,
                attributes,
            } => self.add_column_sql(table, field, attributes),
            DdlIntent::ModifyColumn {
                table,
                field,
                attributes,
            } => self.modify_column_sql(table, field, attributes),
            DdlIntent::DropColumn { table, field } => self.drop_column_sql(table, field),
            DdlIntent::CreateIndex { table, field, name } => {
                self.create_index_sql(table, field, name)
            }
        }
    }

    fn table_identifier(&self, table: &str) -> String {
        quote_identifier(&prefixed_table(&self.table_prefix, table))
    }

    /// `` `name` type[(n)] [UNSIGNED] NULL|NOT NULL [DEFAULT '...'] [AUTO_INCREMENT] ``
    pub fn column_definition(&self, field: &str, attributes: &FieldAttributes) -> String {
        let mut definition = format!("{} {}", quote_identifier(field), attributes.field_type);

        if let Some(constraint) = attributes.constraint {
            definition.push_str(&format!("({})", constraint));
        }

        if attributes.unsigned {
            definition.push_str(" UNSIGNED");
        }

        definition.push_str(if attributes.nullable { " NULL" } else { " NOT NULL" });

        if let Some(default) = &attributes.default {
            definition.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
        }

        if attributes.auto_increment {
            definition.push_str(" AUTO_INCREMENT");
        }

        definition
    }

    pub fn create_table_sql(&self, table: &NewTable) -> String {
        let mut column_defs: Vec<String> = table
            .columns
            .iter()
            .map(|(field, attributes)| format!("  {}", self.column_definition(field, attributes)))
            .collect();

        if let Some(pk) = &table.primary_key {
            column_defs.push(format!("  PRIMARY KEY ({})", quote_identifier(pk)));
        }

        for key in &table.keys {
            column_defs.push(format!(
                "  KEY {} ({})",
                quote_identifier(key),
                quote_identifier(key)
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n) DEFAULT CHARACTER SET={} COLLATE={};",
            self.table_identifier(&table.name),
            column_defs.join(",\n"),
            self.charset,
            self.collation
        )
    }

    pub fn add_column_sql(
        &self,
        table: &str,
        field: &str,
        attributes: &FieldAttributes,
    ) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.table_identifier(table),
            self.column_definition(field, attributes)
        )
    }

    pub fn modify_column_sql(
        &self,
        table: &str,
        field: &str,
        attributes: &FieldAttributes,
    ) -> String {
        format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            self.table_identifier(table),
            self.column_definition(field, attributes)
        )
    }

    pub fn drop_column_sql(&self, table: &str, field: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.table_identifier(table),
            quote_identifier(field)
        )
    }

    pub fn create_index_sql(&self, table: &str, field: &str, index_name: &str) -> String {
        format!(
            "CREATE INDEX {} ON {} ({});",
            quote_identifier(index_name),
            self.table_identifier(table),
            quote_identifier(field)
        )
    }
}
