//! Single-connection database handle over the sqlx `Any` driver.
use derive_builder::Builder;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use url::Url;
use url::form_urlencoded::byte_serialize;

use super::dialect::Dialect;
use crate::config::{CONNECT_TIMEOUT, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PROTOCOL, DEFAULT_USER};
use crate::error::ImportError;

/// Parts of a `<protocol>://<user>:<password>@<host>[:port]/<database>` connection string
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ConnectionSettings {
    #[builder(default = "DEFAULT_PROTOCOL.to_string()")]
    pub protocol: String,
    #[builder(default = "DEFAULT_HOST.to_string()")]
    pub host: String,
    #[builder(default, setter(into, strip_option))]
    pub port: Option<u16>,
    #[builder(default = "DEFAULT_USER.to_string()")]
    pub user: String,
    #[builder(default)]
    pub password: String,
    #[builder(default = "DEFAULT_DATABASE.to_string()")]
    pub database: String,
}

impl ConnectionSettings {
    /// Build the connection string, percent-encoding the user and password
    pub fn connection_url(&self) -> Result<String, ImportError> {
        let mut url = format!(
            "{}://{}:{}@{}",
            self.protocol,
            encode_userinfo(&self.user),
            encode_userinfo(&self.password),
            self.host
        );
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        url.push('/');
        url.push_str(&self.database);

        Url::parse(&url).map_err(|e| {
            ImportError::Config(format!(
                "invalid connection settings ({}): {e}",
                redact_url(&url)
            ))
        })?;

        Ok(url)
    }
}

/// Percent-encode a user name or password for the userinfo part of a URL
///
/// Form encoding writes spaces as `+`; a literal `+` is already `%2B`, so
/// every remaining `+` is a space.
fn encode_userinfo(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Replace the password of a connection string for display
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Database handle shared by every load of a run
///
/// Holds at most one connection so statements run strictly in order.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: AnyPool,
    dialect: Dialect,
}

impl Pool {
    /// Open the connection described by `url`
    pub async fn connect(url: &str) -> Result<Self, ImportError> {
        let redacted = redact_url(url);
        let dialect = Dialect::from_url(url).ok_or_else(|| {
            ImportError::Config(format!(
                "unsupported database in '{redacted}'. Supported schemes: mysql, postgres, sqlite"
            ))
        })?;

        sqlx::any::install_default_drivers();

        let inner = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await
            .map_err(|source| ImportError::Connection {
                target: redacted.clone(),
                source,
            })?;

        tracing::info!(database = %redacted, ?dialect, "connected");

        Ok(Self { inner, dialect })
    }

    /// Create an in-memory SQLite pool for testing
    #[cfg(test)]
    pub async fn sqlite_in_memory() -> Result<Self, ImportError> {
        Self::connect("sqlite::memory:").await
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn inner(&self) -> &AnyPool {
        &self.inner
    }

    /// Execute a statement without parameters (DDL like DROP/CREATE TABLE)
    pub async fn execute_query(&self, sql: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(sql).execute(&self.inner).await?;
        Ok(result.rows_affected())
    }

    /// Check whether a table with this exact name exists in the current schema
    pub async fn table_exists(&self, table_name: &str) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(self.dialect.table_exists_sql())
            .bind(table_name)
            .fetch_one(&self.inner)
            .await?;
        Ok(count > 0)
    }

    pub async fn close(&self) {
        self.inner.close().await;
    }
}
