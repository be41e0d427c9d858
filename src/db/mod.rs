//! Database layer - connection handling, SQL dialects and schema inference

pub mod dialect;
pub mod pool;
pub mod schema;

pub use dialect::Dialect;
pub use pool::{ConnectionSettings, ConnectionSettingsBuilder, Pool};
pub use schema::SchemaInferrer;
