use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use table_sync::config::{self, LoggingConfig};
use table_sync::utils::logging::init_logging;
use table_sync::{DdlGenerator, DeclaredSchema, TableSync};

#[derive(Parser)]
#[command(name = "table_sync")]
#[command(version)]
#[command(about = "Keep MySQL tables in line with their declarations")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "table_sync.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the DDL needed to reconcile the declared tables
    Plan {
        /// Declared schema (.toml, .json, .yaml)
        #[arg(short, long)]
        schema: String,

        /// Only this table
        #[arg(short, long)]
        table: Option<String>,
    },
    /// Reconcile the declared tables and apply the DDL
    Apply {
        /// Declared schema (.toml, .json, .yaml)
        #[arg(short, long)]
        schema: String,

        /// Only this table
        #[arg(short, long)]
        table: Option<String>,

        /// Log the DDL instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print an existing table as a declaration
    Dump {
        table: String,

        #[arg(short, long, value_enum, default_value = "toml")]
        format: DumpFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Toml,
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    let logging = config.logging.clone().or_else(|| {
        Some(LoggingConfig {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        })
    });
    init_logging(&logging)?;

    if let Commands::Apply { dry_run: true, .. } = &cli.command {
        config.reconcile.dry_run = true;
    }

    let generator = DdlGenerator::new(&config);
    let sync = TableSync::connect(config).await?;

    match cli.command {
        Commands::Plan { schema, table } => {
            let schema = select_tables(&schema, table.as_deref())?;

            for declared in schema.tables() {
                let diff = sync.plan(declared).await?;
                if diff.is_empty() {
                    println!("-- {}: in sync", declared.name);
                    continue;
                }

                println!("-- {}: {} change(s)", declared.name, diff.len());
                for intent in &diff.intents {
                    println!("-- {}", intent);
                    println!("{}", generator.generate(intent));
                }
            }
        }
        Commands::Apply { schema, table, .. } => {
            let schema = select_tables(&schema, table.as_deref())?;
            sync.reconcile_and_apply_all(&schema).await?;
        }
        Commands::Dump { table, format } => {
            let Some(definition) = sync.introspect(&table).await? else {
                bail!("Table {} does not exist", table);
            };

            let schema: DeclaredSchema = std::iter::once(definition).collect();
            let rendered = match format {
                DumpFormat::Toml => toml::to_string_pretty(&schema)?,
                DumpFormat::Json => serde_json::to_string_pretty(&schema)?,
                DumpFormat::Yaml => serde_yaml::to_string(&schema)?,
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn select_tables(path: &str, table: Option<&str>) -> Result<DeclaredSchema> {
    let schema = config::load_schema_file(path)
        .with_context(|| format!("Failed to load declared schema from {}", path))?;

    match table {
        None => Ok(schema),
        Some(name) => match schema.table(name) {
            Some(definition) => Ok(std::iter::once(definition.clone()).collect()),
            None => bail!("Table {} is not declared in {}", name, path),
        },
    }
}
