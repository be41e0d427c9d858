//! SQL rendering differences between the supported backends

use super::schema::SqlType;

/// Backend SQL dialect, detected from the connection string scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Detect the dialect from a connection string such as `mysql://...` or `sqlite::memory:`
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.split_once(':')?;
        match scheme.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    /// Quote an identifier, doubling any embedded quote character
    pub fn quote_ident(&self, ident: &str) -> String {
        let quote = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(quote);
        for ch in ident.chars() {
            if ch == quote {
                quoted.push(quote);
            }
            quoted.push(ch);
        }
        quoted.push(quote);
        quoted
    }

    /// Bind placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Placeholder for a value of `sql_type`, with a cast where the backend
    /// will not coerce a text parameter on its own
    pub fn value_placeholder(&self, index: usize, sql_type: &SqlType) -> String {
        let placeholder = self.placeholder(index);
        match (self, sql_type) {
            (Dialect::Postgres, SqlType::Date | SqlType::Timestamp) => {
                format!("CAST({} AS {})", placeholder, self.type_name(sql_type))
            }
            _ => placeholder,
        }
    }

    /// Column type name used in CREATE TABLE
    pub fn type_name(&self, sql_type: &SqlType) -> &'static str {
        match (self, sql_type) {
            (_, SqlType::Boolean) => "BOOLEAN",
            (_, SqlType::BigInt) => "BIGINT",
            (Dialect::MySql, SqlType::Double) => "DOUBLE",
            (Dialect::Postgres, SqlType::Double) => "DOUBLE PRECISION",
            (Dialect::Sqlite, SqlType::Double) => "REAL",
            (_, SqlType::Date) => "DATE",
            (Dialect::MySql, SqlType::Timestamp) => "DATETIME",
            (Dialect::Postgres | Dialect::Sqlite, SqlType::Timestamp) => "TIMESTAMP",
            (_, SqlType::Text) => "TEXT",
        }
    }

    pub fn drop_table_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table_name))
    }

    /// Catalog query counting tables named by the single bind parameter
    pub(crate) fn table_exists_sql(&self) -> &'static str {
        match self {
            Dialect::MySql => {
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?"
            }
            Dialect::Postgres => {
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1"
            }
            Dialect::Sqlite => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        }
    }
}
