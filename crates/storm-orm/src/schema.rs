//! Schema synthesis.
//!
//! Compares an entity's fields with the live catalog and runs only the DDL
//! needed to close the gap: CREATE TABLE for a missing table, one ADD COLUMN
//! per missing column, nothing otherwise. Existing columns are never
//! altered or dropped.

use storm_core::ddl::{add_column_sql, create_sequence_sql, create_table_sql, uses_sequence};
use storm_core::{Entity, TableName};
use tracing::{debug, info};

use crate::catalog::{column_exists, sequence_exists, table_exists};
use crate::error::{Result, StormError};
use crate::executor::Executor;

/// Options for [`setup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupOptions {
    /// Schema holding the table. Falls back to the entity's own schema,
    /// then to the connection's current schema.
    pub schema: Option<String>,
    /// Back an integer primary key with a sequence.
    pub auto_increment_pk: bool,
    /// Run this SQL instead of synthesizing anything.
    pub raw_sql: Option<String>,
    /// Only report the DDL, running nothing but catalog queries.
    pub dry_run: bool,
}

impl SetupOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Enables or disables the auto-increment primary key.
    #[must_use]
    pub const fn auto_increment_pk(mut self, enabled: bool) -> Self {
        self.auto_increment_pk = enabled;
        self
    }

    /// Sets SQL to run verbatim.
    #[must_use]
    pub fn raw_sql(mut self, sql: impl Into<String>) -> Self {
        self.raw_sql = Some(sql.into());
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    fn raw(&self) -> Option<&str> {
        self.raw_sql.as_deref().filter(|sql| !sql.trim().is_empty())
    }
}

/// What [`setup`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupReport {
    /// Raw SQL was run.
    Raw {
        /// The SQL.
        statement: String,
    },
    /// The table was created.
    Created {
        /// Statements in execution order.
        statements: Vec<String>,
    },
    /// Missing columns were added.
    Altered {
        /// Added column names.
        added: Vec<String>,
        /// Statements in execution order.
        statements: Vec<String>,
    },
    /// The table already matched.
    Unchanged,
}

impl SetupReport {
    /// Statements that were run, or would be in dry-run mode.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Self::Raw { statement } => vec![statement.as_str()],
            Self::Created { statements } | Self::Altered { statements, .. } => {
                statements.iter().map(String::as_str).collect()
            }
            Self::Unchanged => Vec::new(),
        }
    }
}

/// Brings the table of `entity` in line with its fields.
///
/// # Errors
///
/// Returns [`StormError::Schema`] naming the first DDL statement that
/// failed, or the catalog lookup that failed. Statements run before it are
/// not rolled back.
pub async fn setup<E, T>(exec: &E, entity: &T, options: &SetupOptions) -> Result<SetupReport>
where
    E: Executor,
    T: Entity,
{
    info!(table = %T::TABLE, dry_run = options.dry_run, "Running setup");

    if let Some(sql) = options.raw() {
        run_raw(exec, sql, options.dry_run).await?;
        return Ok(SetupReport::Raw {
            statement: sql.to_string(),
        });
    }

    let schema = options
        .schema
        .clone()
        .or_else(|| T::SCHEMA.map(String::from));
    let table = TableName::new(T::TABLE).in_schema(schema);
    let fields = entity.fields();

    if !catalog_lookup(&table, table_exists(exec, &table).await)? {
        let mut statements = Vec::new();
        if uses_sequence(&fields, options.auto_increment_pk)
            && !catalog_lookup(&table, sequence_exists(exec, &table).await)?
        {
            statements.push(create_sequence_sql(&table));
        }
        statements.push(create_table_sql(&table, &fields, options.auto_increment_pk)?);

        run_all(exec, &statements, options.dry_run).await?;
        info!(table = %table.qualified(), "Table created");
        return Ok(SetupReport::Created { statements });
    }

    let mut added = Vec::new();
    let mut statements = Vec::new();
    for field in &fields {
        let column = field.column_name();
        if !catalog_lookup(&table, column_exists(exec, &table, &column).await)? {
            statements.push(add_column_sql(&table, field));
            added.push(column);
        }
    }

    if statements.is_empty() {
        debug!(table = %table.qualified(), "Table up to date");
        return Ok(SetupReport::Unchanged);
    }

    run_all(exec, &statements, options.dry_run).await?;
    info!(table = %table.qualified(), added = ?added, "Columns added");
    Ok(SetupReport::Altered { added, statements })
}

/// Alias of [`setup`].
///
/// # Errors
///
/// See [`setup`].
pub async fn setup_table<E, T>(exec: &E, entity: &T, options: &SetupOptions) -> Result<SetupReport>
where
    E: Executor,
    T: Entity,
{
    setup(exec, entity, options).await
}

/// Runs schema SQL verbatim. The text may hold several statements.
///
/// # Errors
///
/// Returns [`StormError::Schema`] when the server rejects the SQL.
pub async fn run_raw<E: Executor>(exec: &E, sql: &str, dry_run: bool) -> Result<()> {
    run_all(exec, &[sql.to_string()], dry_run).await
}

fn catalog_lookup(table: &TableName, found: Result<bool>) -> Result<bool> {
    found.map_err(|e| StormError::Schema {
        statement: format!("catalog lookup for {}", table.qualified()),
        message: e.to_string(),
    })
}

async fn run_all<E: Executor>(exec: &E, statements: &[String], dry_run: bool) -> Result<()> {
    for sql in statements {
        if dry_run {
            info!(sql = %sql, "Dry run, not executing");
            continue;
        }
        exec.exec(sql, &[]).await.map_err(|e| StormError::Schema {
            statement: sql.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_raw_sql_is_ignored() {
        assert_eq!(SetupOptions::new().raw_sql("  \n").raw(), None);
        assert_eq!(
            SetupOptions::new().raw_sql("SELECT 1").raw(),
            Some("SELECT 1")
        );
    }

    #[test]
    fn test_builder() {
        let options = SetupOptions::new()
            .schema("public")
            .auto_increment_pk(true)
            .dry_run(true);
        assert_eq!(options.schema.as_deref(), Some("public"));
        assert!(options.auto_increment_pk);
        assert!(options.dry_run);
        assert_eq!(options.raw_sql, None);
    }

    #[test]
    fn test_report_statements() {
        let report = SetupReport::Altered {
            added: vec!["age".into()],
            statements: vec!["ALTER TABLE person ADD COLUMN age int8".into()],
        };
        assert_eq!(
            report.statements(),
            vec!["ALTER TABLE person ADD COLUMN age int8"]
        );
        assert!(SetupReport::Unchanged.statements().is_empty());
    }
}
