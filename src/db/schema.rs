use chrono::{NaiveDate, NaiveDateTime};

use super::dialect::Dialect;
use crate::config::NA_VALUES;

/// Field values from a record (as strings from CSV)
/// Used for schema inference - just the raw field values without metadata
pub type FieldValues = Vec<String>;

/// Column type inferred from source data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    BigInt,
    Double,
    Date,
    Timestamp,
    Text,
}

impl SqlType {
    /// Find the most specific common type that accommodates both types
    pub fn common_type(&self, other: &SqlType) -> SqlType {
        if self == other {
            return self.clone();
        }

        use SqlType::*;
        match (self, other) {
            (BigInt, Double) | (Double, BigInt) => Double,
            (Date, Timestamp) | (Timestamp, Date) => Timestamp,
            _ => Text,
        }
    }
}

/// A column in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

/// A table schema (ordered collection of columns)
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Returns true if the raw field is one of the recognised missing-value tokens
///
/// Matches the field exactly; padded tokens such as `" NA "` are text.
pub fn is_na(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

pub fn parse_bool(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// True if `value` starts with a `YYYY-MM-DD` shaped date (fixed widths)
fn has_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
}

/// Parse an ISO `YYYY-MM-DD` date
///
/// Day/month order guesses and short years are not accepted, so values like
/// `12/01/2024` or `5-3-12` stay text.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 || !has_iso_date_shape(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parse an ISO timestamp: `YYYY-MM-DD`, a space or `T`, then `HH:MM[:SS[.f]]`
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",    // 2025-01-01 12:34:56
        "%Y-%m-%dT%H:%M:%S",    // 2025-01-01T12:34:56 (ISO 8601)
        "%Y-%m-%d %H:%M:%S%.f", // With fractional seconds
        "%Y-%m-%dT%H:%M:%S%.f", // ISO 8601 with fractional seconds
        "%Y-%m-%d %H:%M",       // Without seconds
        "%Y-%m-%dT%H:%M",       // ISO 8601 without seconds
    ];

    let bytes = value.as_bytes();
    let time_shaped = bytes.len() >= 16
        && matches!(bytes[10], b' ' | b'T')
        && bytes[13] == b':'
        && [11, 12, 14, 15].iter().all(|&i| bytes[i].is_ascii_digit());
    let seconds_shaped = bytes.len() == 16
        || (bytes.len() >= 19
            && bytes[16] == b':'
            && bytes[17].is_ascii_digit()
            && bytes[18].is_ascii_digit()
            && (bytes.len() == 19 || bytes[19] == b'.'));
    if !seconds_shaped {
        return None;
    }
    if !has_iso_date_shape(value) || !time_shaped {
        return None;
    }

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Parse a finite floating point value
pub fn parse_double(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Schema inferrer for analyzing data and generating DDL
pub struct SchemaInferrer;

impl SchemaInferrer {
    /// Infer the type of a single value; `None` means null
    fn infer_value_type(value: &str) -> Option<SqlType> {
        if is_na(value) {
            return None;
        }

        if parse_bool(value).is_some() {
            return Some(SqlType::Boolean);
        }

        let trimmed = value.trim();
        if trimmed.parse::<i64>().is_ok() {
            return Some(SqlType::BigInt);
        }

        if parse_double(trimmed).is_some() {
            return Some(SqlType::Double);
        }

        // Validate with chrono so that e.g. 2025-02-30 stays text
        if parse_date(value).is_some() {
            return Some(SqlType::Date);
        }

        if parse_timestamp(value).is_some() {
            return Some(SqlType::Timestamp);
        }

        Some(SqlType::Text)
    }

    /// Infer column type and nullability from all values of the column
    fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a str>) -> (SqlType, bool) {
        let mut inferred_type: Option<SqlType> = None;
        let mut has_nulls = false;

        for value in values {
            match Self::infer_value_type(value) {
                Some(val_type) => {
                    inferred_type = Some(match inferred_type {
                        None => val_type,
                        Some(current) => current.common_type(&val_type),
                    });
                }
                None => {
                    has_nulls = true;
                }
            }
        }

        match inferred_type {
            Some(sql_type) => (sql_type, has_nulls),
            // No values at all (header-only file) or only nulls
            None => (SqlType::Text, true),
        }
    }

    /// Infer a schema from the column names and every data row
    ///
    /// Rows shorter than the header count as null in the missing columns.
    pub fn infer_from_data(column_names: &[String], rows: &[FieldValues]) -> Schema {
        let columns = column_names
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let values = rows
                    .iter()
                    .map(|row| row.get(col_idx).map(String::as_str).unwrap_or(""));
                let (sql_type, nullable) = Self::infer_column_type(values);
                Column {
                    name: name.clone(),
                    sql_type,
                    nullable,
                }
            })
            .collect();

        Schema { columns }
    }

    /// Generate DDL statement for creating a table
    pub fn generate_ddl(dialect: Dialect, table_name: &str, schema: &Schema) -> String {
        let mut ddl = format!("CREATE TABLE {} (\n", dialect.quote_ident(table_name));

        let column_defs: Vec<String> = schema
            .columns
            .iter()
            .map(|col| {
                let nullable_clause = if col.nullable { "" } else { " NOT NULL" };
                format!(
                    "  {} {}{}",
                    dialect.quote_ident(&col.name),
                    dialect.type_name(&col.sql_type),
                    nullable_clause
                )
            })
            .collect();

        ddl.push_str(&column_defs.join(",\n"));
        ddl.push_str("\n)");

        ddl
    }
}
