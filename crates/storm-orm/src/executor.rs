//! The executor boundary and its sqlx PostgreSQL implementation.
//!
//! The schema synthesizer and the persistence layer only ever talk to an
//! [`Executor`]. Statements use `$n` placeholders and carry their parameters
//! as [`SqlValue`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use storm_core::SqlValue;
use tracing::{debug, error};

use crate::config::ConnectorConfig;
use crate::error::{Result, StormError};

/// Runs statements against a database.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Runs a statement, returning the number of affected rows.
    async fn exec(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Runs a statement and collects the rows it returns.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;
}

/// One result row, decoded into [`SqlValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Values in result order.
    pub values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from column/value pairs.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SqlValue)>,
        S: Into<String>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(column, value)| (column.into(), value))
            .unzip();
        Self { columns, values }
    }

    /// Value of the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|index| self.values.get(index))
    }

    /// Value at a position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Executor backed by a sqlx PostgreSQL pool.
///
/// Each call borrows one pooled connection for the duration of a single
/// statement.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
    quiet: bool,
}

impl PgExecutor {
    /// Connects using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Connection`] when the pool cannot be opened.
    pub async fn connect(config: &ConnectorConfig) -> Result<Self> {
        let pool = config.connect().await?;
        Ok(Self {
            pool,
            quiet: config.quiet,
        })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, quiet: bool) -> Self {
        Self { pool, quiet }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn report(&self, sql: &str, err: sqlx::Error) -> StormError {
        let err = StormError::from(err);
        if self.quiet {
            debug!(sql = %sql, error = %err, "Statement failed");
        } else {
            error!(sql = %sql, error = %err, "Statement failed");
        }
        err
    }
}

impl Executor for PgExecutor {
    async fn exec(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(sql = %sql, params = ?param_strings(params), "Executing statement");

        // Parameterless text may hold several statements
        let result = if params.is_empty() {
            sqlx::raw_sql(sql).execute(&self.pool).await
        } else {
            bind_all(sqlx::query(sql), params)
                .execute(&self.pool)
                .await
        };

        result
            .map(|done| done.rows_affected())
            .map_err(|e| self.report(sql, e))
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        debug!(sql = %sql, params = ?param_strings(params), "Running query");

        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.report(sql, e))?;

        rows.iter()
            .map(|row| decode_row(row).map_err(|e| self.report(sql, e)))
            .collect()
    }
}

fn param_strings(params: &[SqlValue]) -> Vec<String> {
    params.iter().map(SqlValue::to_param_string).collect()
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in params {
        query = bind_param(query, value.clone());
    }
    query
}

fn bind_param(
    query: Query<'_, Postgres, PgArguments>,
    value: SqlValue,
) -> Query<'_, Postgres, PgArguments> {
    match value {
        // Built statements inline NULL, so only caller-supplied params get here
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Bytes(b) => query.bind(b),
        SqlValue::Json(v) => query.bind(v),
        SqlValue::Numeric(d) => query.bind(d),
    }
}

fn decode_row(row: &PgRow) -> std::result::Result<Row, sqlx::Error> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(decode_value(row, index, column.type_info().name())?);
    }
    Ok(Row { columns, values })
}

fn decode_value(
    row: &PgRow,
    index: usize,
    type_name: &str,
) -> std::result::Result<SqlValue, sqlx::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(SqlValue::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|n| SqlValue::Int(n.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|n| SqlValue::Int(n.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|f| SqlValue::Float(f.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(SqlValue::Float),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(SqlValue::Numeric),
        "BYTEA" => row.try_get::<Option<Vec<u8>>, _>(index)?.map(SqlValue::Bytes),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)?
            .map(SqlValue::Json),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|t| SqlValue::Text(t.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|t| SqlValue::Text(t.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| SqlValue::Text(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text)
        }
        // geography and other extension types arrive in their binary form
        _ => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
            .map(SqlValue::Bytes),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::from_pairs([
            ("id", SqlValue::Int(1)),
            ("Name", SqlValue::Text("Ann".into())),
        ]);
        assert_eq!(row.get("name"), Some(&SqlValue::Text("Ann".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_index(0), Some(&SqlValue::Int(1)));
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_param_strings_for_logging() {
        assert_eq!(
            param_strings(&[SqlValue::Null, SqlValue::Int(3)]),
            vec!["null", "3"]
        );
    }
}
