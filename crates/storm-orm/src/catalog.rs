//! Catalog predicates over `information_schema`.
//!
//! A table without an explicit schema is looked up in `current_schema()`.

use storm_core::{SqlValue, TableName};

use crate::error::Result;
use crate::executor::Executor;

/// Whether the table exists.
pub async fn table_exists<E: Executor>(exec: &E, table: &TableName) -> Result<bool> {
    let (schema, mut params) = schema_predicate("table_schema", table);
    params.push(SqlValue::Text(table.table().to_string()));
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
         WHERE {schema} AND table_name = ${})",
        params.len()
    );
    exists(exec, &sql, &params).await
}

/// Whether the table has the column.
pub async fn column_exists<E: Executor>(exec: &E, table: &TableName, column: &str) -> Result<bool> {
    let (schema, mut params) = schema_predicate("table_schema", table);
    params.push(SqlValue::Text(table.table().to_string()));
    params.push(SqlValue::Text(column.to_lowercase()));
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM information_schema.columns \
         WHERE {schema} AND table_name = ${} AND column_name = ${})",
        params.len() - 1,
        params.len()
    );
    exists(exec, &sql, &params).await
}

/// Whether the auto-increment sequence of the table exists.
pub async fn sequence_exists<E: Executor>(exec: &E, table: &TableName) -> Result<bool> {
    let (schema, mut params) = schema_predicate("sequence_schema", table);
    params.push(SqlValue::Text(table.sequence()));
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM information_schema.sequences \
         WHERE {schema} AND sequence_name = ${})",
        params.len()
    );
    exists(exec, &sql, &params).await
}

fn schema_predicate(column: &str, table: &TableName) -> (String, Vec<SqlValue>) {
    match table.schema() {
        Some(schema) => (
            format!("{column} = $1"),
            vec![SqlValue::Text(schema.to_string())],
        ),
        None => (format!("{column} = current_schema()"), Vec::new()),
    }
}

async fn exists<E: Executor>(exec: &E, sql: &str, params: &[SqlValue]) -> Result<bool> {
    let rows = exec.query(sql, params).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get_index(0))
        .is_some_and(|value| *value == SqlValue::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_predicate_with_schema() {
        let table = TableName::new("person").in_schema(Some("public"));
        let (sql, params) = schema_predicate("table_schema", &table);
        assert_eq!(sql, "table_schema = $1");
        assert_eq!(params, vec![SqlValue::Text("public".into())]);
    }

    #[test]
    fn test_schema_predicate_defaults_to_current_schema() {
        let (sql, params) = schema_predicate("table_schema", &TableName::new("person"));
        assert_eq!(sql, "table_schema = current_schema()");
        assert!(params.is_empty());
    }
}
