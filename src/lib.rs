// Public API - the runner plus the types its arguments and results are made of
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod formats;
pub mod loader;
pub mod runner;
pub mod telemetry;

// Internal modules
mod writer;
