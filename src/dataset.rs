//! The set of (table, source file) pairs imported by one run

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_TABLES;

/// One table of a dataset and the file it is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub table: String,
    pub file_name: String,
}

/// Ordered list of entries rooted at a base directory
#[derive(Debug, Clone)]
pub struct Dataset {
    base_dir: PathBuf,
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    /// An empty dataset; entries load in the order they are added
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// The five-table food delivery dataset
    pub fn default_tables(base_dir: impl AsRef<Path>) -> Self {
        DEFAULT_TABLES
            .iter()
            .fold(Self::new(base_dir), |dataset, (table, file_name)| {
                dataset.with_entry(*table, *file_name)
            })
    }

    pub fn with_entry(mut self, table: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.entries.push(DatasetEntry {
            table: table.into(),
            file_name: file_name.into(),
        });
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full path of an entry's source file
    pub fn source_path(&self, entry: &DatasetEntry) -> PathBuf {
        self.base_dir.join(&entry.file_name)
    }
}
