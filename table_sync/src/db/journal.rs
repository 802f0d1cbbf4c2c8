//! DDL journal
//!
//! Every statement the executor runs (or would run, in a dry run) is appended
//! to a per-table `.sql` file so the changes of one run can be reviewed or
//! replayed by hand.

use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::naming::format_file_name;

/// Append-only record of the statements of a single run
#[derive(Debug, Clone)]
pub struct Journal {
    directory: PathBuf,
    run_id: String,
}

impl Journal {
    /// Open a journal in `directory`, creating it if needed
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            run_id: generate_run_id(),
        })
    }

    /// File the statements for `table` go to
    pub fn path_for(&self, table: &str) -> PathBuf {
        self.directory
            .join(format!("{}_{}.sql", self.run_id, format_file_name(table)))
    }

    /// Append one statement
    pub fn record(&self, table: &str, sql: &str) -> Result<()> {
        let path = self.path_for(table);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}\n", sql)?;

        tracing::trace!(path = %path.display(), "Journaled statement");
        Ok(())
    }
}

fn generate_run_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}
