//! Delimited file parsing into typed in-memory tables

pub mod delimited;
pub mod tabular;

pub use delimited::{DelimitedConfig, DelimitedReader};
pub use tabular::{TabularData, Value};
