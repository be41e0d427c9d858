use chrono::{NaiveDate, NaiveDateTime};

use crate::db::schema::{
    FieldValues, Schema, SqlType, is_na, parse_bool, parse_date, parse_double, parse_timestamp,
};

/// A single typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Convert a raw field into a value of the column's inferred type
    ///
    /// The type was inferred from these same fields, so a field that does not
    /// parse can only be a missing value.
    pub fn from_field(raw: &str, sql_type: &SqlType) -> Value {
        if is_na(raw) {
            return Value::Null;
        }

        let parsed = match sql_type {
            SqlType::Boolean => parse_bool(raw).map(Value::Boolean),
            SqlType::BigInt => raw.trim().parse::<i64>().ok().map(Value::Integer),
            SqlType::Double => parse_double(raw).map(Value::Float),
            SqlType::Date => parse_date(raw).map(Value::Date),
            SqlType::Timestamp => parse_timestamp(raw)
                .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
                .map(Value::Timestamp),
            SqlType::Text => Some(Value::Text(raw.to_string())),
        };

        parsed.unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// In-memory row/column data parsed from one delimited file
#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl TabularData {
    /// Build typed rows from raw records using an already inferred schema
    ///
    /// Records shorter than the schema are padded with nulls.
    pub fn from_records(schema: Schema, records: Vec<FieldValues>) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| match record.get(idx) {
                        Some(raw) => Value::from_field(raw, &column.sql_type),
                        None => Value::Null,
                    })
                    .collect()
            })
            .collect();

        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a cell by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col_idx = self.schema.column_names().position(|name| name == column)?;
        self.rows.get(row)?.get(col_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SchemaInferrer;

    fn build(names: &[&str], records: &[&[&str]]) -> TabularData {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let records: Vec<FieldValues> = records
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect();
        let schema = SchemaInferrer::infer_from_data(&names, &records);
        TabularData::from_records(schema, records)
    }

    #[test]
    fn test_typed_rows() {
        let data = build(
            &["id", "amount", "paid", "placed_on"],
            &[&["1", "10.5", "true", "2024-01-15"], &["2", "20", "False", ""]],
        );

        assert_eq!(data.len(), 2);
        assert_eq!(data.get(0, "id"), Some(&Value::Integer(1)));
        assert_eq!(data.get(1, "amount"), Some(&Value::Float(20.0)));
        assert_eq!(data.get(1, "paid"), Some(&Value::Boolean(false)));
        assert_eq!(
            data.get(0, "placed_on"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        );
        assert!(data.get(1, "placed_on").unwrap().is_null());
        assert_eq!(data.get(0, "missing"), None);
        assert_eq!(data.get(5, "id"), None);
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let data = build(&["name"], &[&[" Alice "], &["N/A"], &["42x"]]);

        assert_eq!(data.get(0, "name"), Some(&Value::Text(" Alice ".to_string())));
        assert_eq!(data.get(1, "name"), Some(&Value::Null));
        assert_eq!(data.get(2, "name"), Some(&Value::Text("42x".to_string())));
    }

    #[test]
    fn test_dates_widen_to_timestamps() {
        let data = build(
            &["at"],
            &[&["2024-01-15"], &["2024-01-16 08:30:00"]],
        );

        assert_eq!(data.schema().columns[0].sql_type, SqlType::Timestamp);
        assert_eq!(
            data.get(0, "at"),
            Some(&Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 1, 15)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn test_short_records_are_padded() {
        let data = build(&["a", "b"], &[&["1", "2"], &["3"]]);

        assert_eq!(data.rows()[1], vec![Value::Integer(3), Value::Null]);
    }
}
