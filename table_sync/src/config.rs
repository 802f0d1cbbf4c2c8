//! Configuration handling for TableSync

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::types::DeclaredSchema;

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Load a declared schema (table => field => attributes) from a TOML, JSON
/// or YAML file, picked by extension
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<DeclaredSchema> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let schema = match extension.as_deref() {
        Some("toml") => toml::from_str(&contents).map_err(|e| {
            Error::SchemaDefinitionError(format!("{}: {}", path.display(), e))
        })?,
        Some("json") => serde_json::from_str(&contents).map_err(|e| {
            Error::SchemaDefinitionError(format!("{}: {}", path.display(), e))
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents).map_err(|e| {
            Error::SchemaDefinitionError(format!("{}: {}", path.display(), e))
        })?,
        _ => {
            return Err(Error::SchemaDefinitionError(format!(
                "Unsupported schema file extension: {}",
                path.display()
            )))
        }
    };

    Ok(schema)
}

/// Represents the complete TableSync configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    pub logging: Option<LoggingConfig>,
    pub output: Option<OutputConfig>,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    /// Prepended to every declared table name, like the host application's db prefix
    #[serde(default)]
    pub table_prefix: String,
}

/// Reconciliation and DDL behavior
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Reject definitions with more than one primary key field instead of
    /// letting the last one win
    pub strict_primary_key: bool,
    /// Log the DDL instead of running it
    pub dry_run: bool,
    pub charset: String,
    pub collation: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            strict_primary_key: false,
            dry_run: false,
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

/// Where executed DDL gets journaled
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: String,
}
