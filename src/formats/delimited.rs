use std::collections::HashSet;
use std::path::Path;

use super::tabular::TabularData;
use crate::db::SchemaInferrer;
use crate::db::schema::FieldValues;
use crate::error::LoadError;

/// Configuration for delimited file reading (CSV, TSV, etc.)
#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    pub delimiter: u8,
    pub has_header: bool,
    pub quote: u8,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            quote: b'"',
        }
    }
}

impl DelimitedConfig {
    pub fn csv() -> Self {
        Self::default()
    }
}

/// Reads a whole delimited file into memory and types its columns
pub struct DelimitedReader {
    config: DelimitedConfig,
}

impl DelimitedReader {
    pub fn new(config: DelimitedConfig) -> Self {
        Self { config }
    }

    /// Read and parse the file at `path`
    pub async fn read_path(&self, path: &Path) -> Result<TabularData, LoadError> {
        let buffer = tokio::fs::read(path).await?;
        self.parse(&buffer)
    }

    /// Parse delimited bytes; the first record is the header when configured
    pub fn parse(&self, bytes: &[u8]) -> Result<TabularData, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .quote(self.config.quote)
            .has_headers(false) // header row handled below
            .flexible(true)
            .from_reader(bytes);

        let mut records = csv_reader.records();

        let first = records.next().ok_or(LoadError::EmptyFile)??;
        let first: FieldValues = first.iter().map(|s| s.to_string()).collect();

        let (column_names, mut rows) = if self.config.has_header {
            (normalize_header(&first), Vec::new())
        } else {
            let names = (0..first.len()).map(|i| format!("column_{}", i + 1)).collect();
            (names, vec![first])
        };

        for result in records {
            let record = result?;
            if record.len() > column_names.len() {
                return Err(LoadError::RaggedRow {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    expected: column_names.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let schema = SchemaInferrer::infer_from_data(&column_names, &rows);
        Ok(TabularData::from_records(schema, rows))
    }
}

/// Make header names usable as column names
///
/// Strips a UTF-8 byte order mark, names blank headers `Unnamed: <index>` and
/// suffixes repeated names with `.1`, `.2`, ...
fn normalize_header(header: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (idx, raw) in header.iter().enumerate() {
        let raw = if idx == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw.as_str()
        };

        let base = if raw.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.clone()) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SqlType;
    use crate::formats::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(content: &str) -> Result<TabularData, LoadError> {
        DelimitedReader::new(DelimitedConfig::csv()).parse(content.as_bytes())
    }

    #[tokio::test]
    async fn test_read_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id,name,email").unwrap();
        writeln!(temp_file, "1,Alice,alice@example.com").unwrap();
        writeln!(temp_file, "2,Bob,bob@example.com").unwrap();
        writeln!(temp_file, "3,Charlie,charlie@example.com").unwrap();
        temp_file.flush().unwrap();

        let reader = DelimitedReader::new(DelimitedConfig::csv());
        let data = reader.read_path(temp_file.path()).await.unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.schema().columns.len(), 3);
        assert_eq!(data.get(0, "id"), Some(&Value::Integer(1)));
        assert_eq!(data.get(0, "name"), Some(&Value::Text("Alice".to_string())));
    }

    #[tokio::test]
    async fn test_read_missing_path() {
        let reader = DelimitedReader::new(DelimitedConfig::csv());
        let err = reader
            .read_path(Path::new("/nonexistent/orders.csv"))
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::Read(_)));
    }

    #[test]
    fn test_orders_scenario() {
        let data = parse("id,amount\n1,10.5\n2,20.0\n").unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.schema().columns[0].sql_type, SqlType::BigInt);
        assert_eq!(data.schema().columns[1].sql_type, SqlType::Double);
        assert_eq!(data.get(1, "amount"), Some(&Value::Float(20.0)));
    }

    #[test]
    fn test_quoted_fields() {
        let data = parse("id,address\n1,\"12 Main St, Apt 4\"\n2,\"say \"\"hi\"\"\"\n").unwrap();

        assert_eq!(
            data.get(0, "address"),
            Some(&Value::Text("12 Main St, Apt 4".to_string()))
        );
        assert_eq!(
            data.get(1, "address"),
            Some(&Value::Text("say \"hi\"".to_string()))
        );
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse(""), Err(LoadError::EmptyFile)));
    }

    #[test]
    fn test_header_only() {
        let data = parse("id,name\n").unwrap();

        assert!(data.is_empty());
        assert_eq!(data.schema().columns.len(), 2);
        assert!(data.schema().columns.iter().all(|c| c.sql_type == SqlType::Text));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = parse("id,name\n1,Alice\n2,Bob,extra\n").unwrap_err();

        match err {
            LoadError::RaggedRow {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("Expected RaggedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_padded() {
        let data = parse("id,name\n1,Alice\n2\n").unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.get(1, "name"), Some(&Value::Null));
        assert!(data.schema().columns[1].nullable);
    }

    #[test]
    fn test_header_normalization() {
        let data = parse("\u{feff}id,name,,name,name\n1,a,b,c,d\n").unwrap();
        let names: Vec<&str> = data.schema().column_names().collect();

        assert_eq!(names, vec!["id", "name", "Unnamed: 2", "name.1", "name.2"]);
    }

    #[test]
    fn test_without_header() {
        let reader = DelimitedReader::new(DelimitedConfig {
            has_header: false,
            ..DelimitedConfig::csv()
        });
        let data = reader.parse(b"1,Alice\n2,Bob\n").unwrap();

        assert_eq!(data.len(), 2);
        let names: Vec<&str> = data.schema().column_names().collect();
        assert_eq!(names, vec!["column_1", "column_2"]);
    }

    #[test]
    fn test_invalid_utf8_is_csv_error() {
        let reader = DelimitedReader::new(DelimitedConfig::csv());
        let err = reader.parse(b"id,name\n1,\xff\xfe\n").unwrap_err();

        assert!(matches!(err, LoadError::Csv(_)));
    }
}
