use std::path::PathBuf;

/// Progress events emitted by the loader while a dataset is imported
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// The database connection is open (password redacted)
    Connected { database: String },
    /// A table load is about to parse its source file
    TableStarted { table: String, source: PathBuf },
    /// One chunk of rows was inserted
    BatchWritten {
        table: String,
        rows: u64,
        duration_ms: u64,
    },
    /// The table was replaced and fully populated
    TableLoaded { table: String, rows: u64 },
    /// The source file was missing; the table was left untouched
    TableSkipped { table: String, source: PathBuf },
    /// Parsing or writing failed part way
    TableFailed { table: String, error: String },
}

/// Statistics aggregated from telemetry events
#[derive(Debug, Default, Clone)]
pub struct ProgressStats {
    pub tables_started: usize,
    pub tables_loaded: usize,
    pub tables_skipped: usize,
    pub tables_failed: usize,
    pub rows_written: u64,
    pub batch_durations_ms: Vec<u64>,
}

impl ProgressStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a telemetry event
    pub fn update(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::Connected { .. } => {}
            TelemetryEvent::TableStarted { .. } => {
                self.tables_started += 1;
            }
            TelemetryEvent::BatchWritten { duration_ms, .. } => {
                self.batch_durations_ms.push(*duration_ms);
            }
            TelemetryEvent::TableLoaded { rows, .. } => {
                self.tables_loaded += 1;
                // Only completed tables count; batches of a failed table do not
                self.rows_written += rows;
            }
            TelemetryEvent::TableSkipped { .. } => {
                self.tables_skipped += 1;
            }
            TelemetryEvent::TableFailed { .. } => {
                self.tables_failed += 1;
            }
        }
    }

    /// Calculate percentile from batch durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.batch_durations_ms.is_empty() {
            return None;
        }

        let mut sorted = self.batch_durations_ms.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }

    /// Get p50, p90, p99 percentiles
    pub fn get_percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.percentile(50.0),
            self.percentile(90.0),
            self.percentile(99.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_counts() {
        let mut stats = ProgressStats::new();
        let events = [
            TelemetryEvent::TableStarted {
                table: "orders".into(),
                source: "orders.csv".into(),
            },
            TelemetryEvent::BatchWritten {
                table: "orders".into(),
                rows: 1000,
                duration_ms: 12,
            },
            TelemetryEvent::BatchWritten {
                table: "orders".into(),
                rows: 250,
                duration_ms: 4,
            },
            TelemetryEvent::TableLoaded {
                table: "orders".into(),
                rows: 1250,
            },
            TelemetryEvent::TableSkipped {
                table: "riders".into(),
                source: "riders.csv".into(),
            },
            TelemetryEvent::TableFailed {
                table: "deliveries".into(),
                error: "malformed CSV".into(),
            },
        ];

        for event in &events {
            stats.update(event);
        }

        assert_eq!(stats.tables_started, 1);
        assert_eq!(stats.tables_loaded, 1);
        assert_eq!(stats.tables_skipped, 1);
        assert_eq!(stats.tables_failed, 1);
        assert_eq!(stats.rows_written, 1250);
        assert_eq!(stats.batch_durations_ms, vec![12, 4]);
    }

    #[test]
    fn test_failed_table_rows_not_counted() {
        let mut stats = ProgressStats::new();
        let events = [
            TelemetryEvent::TableStarted {
                table: "deliveries".into(),
                source: "deliveries.csv".into(),
            },
            TelemetryEvent::BatchWritten {
                table: "deliveries".into(),
                rows: 1000,
                duration_ms: 9,
            },
            TelemetryEvent::TableFailed {
                table: "deliveries".into(),
                error: "database write failed".into(),
            },
        ];

        for event in &events {
            stats.update(event);
        }

        assert_eq!(stats.tables_failed, 1);
        assert_eq!(stats.rows_written, 0);
        assert_eq!(stats.batch_durations_ms, vec![9]);
    }

    #[test]
    fn test_percentiles() {
        let stats = ProgressStats {
            batch_durations_ms: (1..=100).rev().collect(),
            ..ProgressStats::default()
        };

        assert_eq!(stats.get_percentiles(), (Some(50), Some(90), Some(99)));
        assert_eq!(stats.percentile(0.0), Some(1));
        assert_eq!(stats.percentile(100.0), Some(100));
        assert_eq!(ProgressStats::new().percentile(50.0), None);
    }
}
