//! Replace-load of one CSV file into one table, and of a whole dataset.

use derive_builder::Builder;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::dataset::Dataset;
use crate::db::Pool;
use crate::error::{ImportError, LoadError};
use crate::formats::{DelimitedConfig, DelimitedReader};
use crate::telemetry::TelemetryEvent;
use crate::writer::TableWriter;

/// How a load treats an existing target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum WritePolicy {
    /// Drop the table (schema and rows) and recreate it from the source file
    #[default]
    ReplaceTable,
}

/// Options fixed for the lifetime of a loader
#[derive(Debug, Clone, Builder)]
pub struct LoaderOptions {
    /// Rows per INSERT statement
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    pub batch_size: usize,
    #[builder(default)]
    pub policy: WritePolicy,
    #[builder(default)]
    pub delimited: DelimitedConfig,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            policy: WritePolicy::default(),
            delimited: DelimitedConfig::default(),
        }
    }
}

/// Result of a completed table load
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub table: String,
    pub source: PathBuf,
    /// Number of data rows in the source file, all of which were inserted
    pub rows_written: u64,
    pub batches: usize,
    pub duration: Duration,
}

/// Outcome of one dataset entry
#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    pub source: PathBuf,
    pub result: Result<LoadResult, ImportError>,
}

/// Loads CSV files into tables under a write policy
pub struct BulkTableLoader {
    options: LoaderOptions,
    reader: DelimitedReader,
}

impl BulkTableLoader {
    pub fn new(options: LoaderOptions) -> Self {
        let reader = DelimitedReader::new(options.delimited.clone());
        Self { options, reader }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load `source` into `table_name`, borrowing the caller's connection
    ///
    /// A missing file fails with [`ImportError::NotFound`] before anything is
    /// touched. A parse or write failure fails with [`ImportError::Load`]; the
    /// table may then be dropped or partially filled.
    pub async fn load(
        &self,
        pool: &Pool,
        table_name: &str,
        source: &Path,
    ) -> Result<LoadResult, ImportError> {
        self.load_with_events(pool, table_name, source, &mut |_| {})
            .await
    }

    /// Load every entry of the dataset in order, continuing past failures
    pub async fn load_dataset(
        &self,
        pool: &Pool,
        dataset: &Dataset,
        mut on_event: impl FnMut(TelemetryEvent),
    ) -> Vec<TableOutcome> {
        let mut outcomes = Vec::with_capacity(dataset.len());

        for entry in dataset.entries() {
            let source = dataset.source_path(entry);
            let result = self
                .load_with_events(pool, &entry.table, &source, &mut on_event)
                .await;

            outcomes.push(TableOutcome {
                table: entry.table.clone(),
                source,
                result,
            });
        }

        outcomes
    }

    async fn load_with_events(
        &self,
        pool: &Pool,
        table_name: &str,
        source: &Path,
        on_event: &mut dyn FnMut(TelemetryEvent),
    ) -> Result<LoadResult, ImportError> {
        let result = self.run_load(pool, table_name, source, on_event).await;

        match &result {
            Ok(loaded) => {
                info!(
                    table = table_name,
                    rows = loaded.rows_written,
                    batches = loaded.batches,
                    duration_ms = loaded.duration.as_millis() as u64,
                    "table loaded"
                );
                on_event(TelemetryEvent::TableLoaded {
                    table: table_name.to_string(),
                    rows: loaded.rows_written,
                });
            }
            Err(ImportError::NotFound { path }) => {
                warn!(table = table_name, path = %path.display(), "source file not found, table skipped");
                on_event(TelemetryEvent::TableSkipped {
                    table: table_name.to_string(),
                    source: path.clone(),
                });
            }
            Err(err) => {
                warn!(table = table_name, error = %err, "table load failed");
                on_event(TelemetryEvent::TableFailed {
                    table: table_name.to_string(),
                    error: err.to_string(),
                });
            }
        }

        result
    }

    async fn run_load(
        &self,
        pool: &Pool,
        table_name: &str,
        source: &Path,
        on_event: &mut dyn FnMut(TelemetryEvent),
    ) -> Result<LoadResult, ImportError> {
        let start = Instant::now();
        let load_error = |source: LoadError| ImportError::Load {
            table: table_name.to_string(),
            source,
        };

        if table_name.trim().is_empty() {
            return Err(load_error(LoadError::EmptyTableName));
        }

        if !is_regular_file(source).await {
            return Err(ImportError::NotFound {
                path: source.to_path_buf(),
            });
        }

        on_event(TelemetryEvent::TableStarted {
            table: table_name.to_string(),
            source: source.to_path_buf(),
        });

        let data = self.reader.read_path(source).await.map_err(load_error)?;

        let summary = match self.options.policy {
            WritePolicy::ReplaceTable => {
                TableWriter::new(pool, self.options.batch_size)
                    .replace_table(table_name, &data, on_event)
                    .await
            }
        }
        .map_err(load_error)?;

        Ok(LoadResult {
            table: table_name.to_string(),
            source: source.to_path_buf(),
            rows_written: summary.rows_written,
            batches: summary.batches,
            duration: start.elapsed(),
        })
    }
}

/// True if `path` exists and is a regular file (symlinks followed)
pub(crate) async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}
