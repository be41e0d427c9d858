//! Configuration constants for the dataset loader
//!
//! This module centralizes the tunable parameters and the fixed dataset layout
//! used throughout the application.

use std::time::Duration;

// ============================================================================
// Connection Configuration
// ============================================================================

/// How long to wait for the single database connection to open
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(45);

pub const DEFAULT_PROTOCOL: &str = "mysql";

pub const DEFAULT_HOST: &str = "localhost";

pub const DEFAULT_USER: &str = "root";

pub const DEFAULT_DATABASE: &str = "zomato";

// ============================================================================
// Write Configuration
// ============================================================================

/// Number of rows sent per INSERT statement
///
/// Chunking only bounds statement size; the resulting table is the same for
/// any batch size.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Upper bound on bind parameters in one statement
///
/// SQLite caps host parameters at 32766; MySQL and PostgreSQL allow 65535.
/// Using the smallest keeps one statement builder valid for every backend.
pub const MAX_BIND_PARAMS: usize = 32766;

// ============================================================================
// Dataset Configuration
// ============================================================================

/// Tables of the default dataset, in load order, with their source file names
pub const DEFAULT_TABLES: [(&str, &str); 5] = [
    ("customers", "customers.csv"),
    ("restaurants", "restaurants.csv"),
    ("riders", "riders.csv"),
    ("orders", "orders.csv"),
    ("deliveries", "deliveries.csv"),
];

/// Field values treated as missing when parsing delimited files
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];
