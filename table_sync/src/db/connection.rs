//! Database connection handling
//!
//! A MySQL pool that answers the introspection queries through
//! `information_schema` and runs DDL.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::db::store::{ColumnKey, ColumnRow, IndexRow, SchemaStore};
use crate::error::Result;
use crate::utils::naming::{prefixed_table, unquote};

/// A MySQL connection pool plus the table prefix it operates under
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: MySqlPool,
    table_prefix: String,
}

// information_schema columns are cast to CHAR so they decode as text on
// every server version
#[derive(FromRow)]
struct ColumnRecord {
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_key: String,
    column_default: Option<String>,
    extra: String,
}

#[derive(FromRow)]
struct IndexRecord {
    index_name: String,
    column_name: Option<String>,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(10);
        let timeout_seconds = config.timeout_seconds.unwrap_or(30);

        let pool = MySqlPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::debug!(pool_size, "Connected to MySQL");

        Ok(Self {
            pool,
            table_prefix: config.table_prefix.clone(),
        })
    }

    /// Execute a SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    fn physical_table(&self, table: &str) -> String {
        prefixed_table(&self.table_prefix, table)
    }
}

#[async_trait]
impl SchemaStore for DatabaseConnection {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = r#"
            SELECT COUNT(*)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_name = ?
        "#;

        let count: i64 = sqlx::query_scalar(sql)
            .bind(self.physical_table(table))
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let sql = r#"
            SELECT COUNT(*)
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?
        "#;

        let count: i64 = sqlx::query_scalar(sql)
            .bind(self.physical_table(table))
            .bind(unquote(column))
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnRow>> {
        let sql = r#"
            SELECT
                CAST(column_name AS CHAR) AS column_name,
                CAST(column_type AS CHAR) AS column_type,
                CAST(is_nullable AS CHAR) AS is_nullable,
                CAST(column_key AS CHAR) AS column_key,
                CAST(column_default AS CHAR) AS column_default,
                CAST(extra AS CHAR) AS extra
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
        "#;

        let records = sqlx::query_as::<_, ColumnRecord>(sql)
            .bind(self.physical_table(table))
            .fetch_all(&self.pool)
            .await?;

        Ok(records
            .into_iter()
            .map(|record| ColumnRow {
                name: record.column_name,
                column_type: record.column_type,
                nullable: record.is_nullable == "YES",
                extra: record.extra,
                key: ColumnKey::from_code(&record.column_key),
                default: record.column_default,
            })
            .collect())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<IndexRow>> {
        let sql = r#"
            SELECT
                CAST(index_name AS CHAR) AS index_name,
                CAST(column_name AS CHAR) AS column_name
            FROM information_schema.statistics
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY index_name, seq_in_index
        "#;

        let records = sqlx::query_as::<_, IndexRecord>(sql)
            .bind(self.physical_table(table))
            .fetch_all(&self.pool)
            .await?;

        // functional index parts have no column
        Ok(records
            .into_iter()
            .filter_map(|record| {
                record.column_name.map(|column_name| IndexRow {
                    index_name: record.index_name,
                    column_name,
                })
            })
            .collect())
    }
}
