use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;
use std::time::Instant;

use crate::config::MAX_BIND_PARAMS;
use crate::db::schema::{Schema, SqlType};
use crate::db::{Dialect, Pool, SchemaInferrer};
use crate::error::LoadError;
use crate::formats::{TabularData, Value};
use crate::telemetry::TelemetryEvent;

type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Totals of one table write
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WriteSummary {
    pub rows_written: u64,
    pub batches: usize,
}

/// Writes parsed data into one table using multi-row INSERT statements
pub(crate) struct TableWriter<'a> {
    pool: &'a Pool,
    batch_size: usize,
}

impl<'a> TableWriter<'a> {
    pub fn new(pool: &'a Pool, batch_size: usize) -> Self {
        Self { pool, batch_size }
    }

    /// Drop the table if present, recreate it from the data's schema and insert every row
    pub async fn replace_table(
        &self,
        table_name: &str,
        data: &TabularData,
        on_event: &mut dyn FnMut(TelemetryEvent),
    ) -> Result<WriteSummary, LoadError> {
        let dialect = self.pool.dialect();

        self.pool
            .execute_query(&dialect.drop_table_sql(table_name))
            .await?;

        let ddl = SchemaInferrer::generate_ddl(dialect, table_name, data.schema());
        tracing::debug!(table = table_name, %ddl, "creating table");
        self.pool.execute_query(&ddl).await?;

        self.insert_rows(table_name, data, on_event).await
    }

    /// Rows per statement: the configured batch size, reduced so the
    /// statement stays under the bind parameter limit
    fn rows_per_statement(&self, num_columns: usize) -> usize {
        let max_rows = (MAX_BIND_PARAMS / num_columns.max(1)).max(1);
        self.batch_size.clamp(1, max_rows)
    }

    async fn insert_rows(
        &self,
        table_name: &str,
        data: &TabularData,
        on_event: &mut dyn FnMut(TelemetryEvent),
    ) -> Result<WriteSummary, LoadError> {
        let schema = data.schema();
        let dialect = self.pool.dialect();
        let rows_per_statement = self.rows_per_statement(schema.columns.len());
        let mut summary = WriteSummary::default();

        for batch in data.rows().chunks(rows_per_statement) {
            let start = Instant::now();
            let insert_sql = build_insert_sql(dialect, table_name, schema, batch.len());

            let mut query = sqlx::query(&insert_sql);
            for row in batch {
                for (value, column) in row.iter().zip(&schema.columns) {
                    query = bind_value(query, value, &column.sql_type);
                }
            }

            let result = query.execute(self.pool.inner()).await?;

            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(
                table = table_name,
                batch = summary.batches,
                rows = batch.len(),
                rows_affected = result.rows_affected(),
                duration_ms,
                "batch written"
            );

            summary.rows_written += batch.len() as u64;
            summary.batches += 1;
            on_event(TelemetryEvent::BatchWritten {
                table: table_name.to_string(),
                rows: batch.len() as u64,
                duration_ms,
            });
        }

        Ok(summary)
    }
}

/// Build `INSERT INTO t (c1, c2) VALUES (..), (..)` for `row_count` rows
fn build_insert_sql(dialect: Dialect, table_name: &str, schema: &Schema, row_count: usize) -> String {
    let column_list: Vec<String> = schema
        .column_names()
        .map(|name| dialect.quote_ident(name))
        .collect();

    let mut param_idx = 1;
    let mut value_groups = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let placeholders: Vec<String> = schema
            .columns
            .iter()
            .map(|col| {
                let placeholder = dialect.value_placeholder(param_idx, &col.sql_type);
                param_idx += 1;
                placeholder
            })
            .collect();
        value_groups.push(format!("({})", placeholders.join(", ")));
    }

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        dialect.quote_ident(table_name),
        column_list.join(", "),
        value_groups.join(", ")
    )
}

/// Bind a single value; dates and timestamps go over the wire in ISO form
fn bind_value<'q>(query: AnyQuery<'q>, value: &'q Value, sql_type: &SqlType) -> AnyQuery<'q> {
    match value {
        Value::Null => bind_null(query, sql_type),
        Value::Boolean(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Date(d) => query.bind(d.format("%Y-%m-%d").to_string()),
        Value::Timestamp(ts) => query.bind(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Text(s) => query.bind(s.as_str()),
    }
}

/// Bind NULL with the column's type so strictly typed backends accept it
fn bind_null<'q>(query: AnyQuery<'q>, sql_type: &SqlType) -> AnyQuery<'q> {
    match sql_type {
        SqlType::Boolean => query.bind(None::<bool>),
        SqlType::BigInt => query.bind(None::<i64>),
        SqlType::Double => query.bind(None::<f64>),
        // Bound as text; PostgreSQL placeholders carry a CAST for dates and timestamps
        SqlType::Date | SqlType::Timestamp | SqlType::Text => query.bind(None::<String>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::Column;

    fn schema() -> Schema {
        Schema {
            columns: vec![
                Column {
                    name: "id".to_string(),
                    sql_type: SqlType::BigInt,
                    nullable: false,
                },
                Column {
                    name: "ordered_on".to_string(),
                    sql_type: SqlType::Date,
                    nullable: true,
                },
            ],
        }
    }

    #[test]
    fn test_insert_sql_mysql() {
        let sql = build_insert_sql(Dialect::MySql, "orders", &schema(), 2);
        assert_eq!(
            sql,
            "INSERT INTO `orders` (`id`, `ordered_on`) VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_insert_sql_postgres_casts_dates() {
        let sql = build_insert_sql(Dialect::Postgres, "orders", &schema(), 2);
        assert_eq!(
            sql,
            "INSERT INTO \"orders\" (\"id\", \"ordered_on\") VALUES \
             ($1, CAST($2 AS DATE)), ($3, CAST($4 AS DATE))"
        );
    }

    #[tokio::test]
    async fn test_rows_per_statement_respects_param_limit() {
        let pool = Pool::sqlite_in_memory().await.unwrap();

        let writer = TableWriter::new(&pool, 1000);
        assert_eq!(writer.rows_per_statement(5), 1000);
        assert_eq!(writer.rows_per_statement(100), MAX_BIND_PARAMS / 100);
        assert_eq!(writer.rows_per_statement(MAX_BIND_PARAMS * 2), 1);

        let writer = TableWriter::new(&pool, 0);
        assert_eq!(writer.rows_per_statement(5), 1);
    }
}
