//! Error types returned by the loader
//!
//! `ImportError` is the per-table (or per-run) outcome callers match on;
//! `LoadError` carries the underlying cause of a failed parse or write.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one table load, or of the whole run for `Connection`
#[derive(Debug, Error)]
pub enum ImportError {
    /// The database connection could not be established
    #[error("cannot connect to {target}: {source}")]
    Connection {
        /// Connection string with the password redacted
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// The source file does not exist or is not a regular file
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Parsing or writing failed; the target table state is unspecified
    #[error("failed to load table '{table}': {source}")]
    Load {
        table: String,
        #[source]
        source: LoadError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ImportError {
    /// True for failures that only skip a table rather than abandon it midway
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportError::NotFound { .. })
    }
}

/// Cause of a failed parse or write
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("table name is empty")]
    EmptyTableName,

    #[error("could not read source file: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("source file has no header row")]
    EmptyFile,

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("database write failed: {0}")]
    Database(#[from] sqlx::Error),
}
