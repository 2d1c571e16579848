//! INSERT, UPDATE, SELECT and DELETE statements for a single table.
//!
//! Bound values get consecutive `$n` placeholders. Raw values and NULL are
//! spliced at their column position and consume no placeholder, so the
//! parameter list always lines up with the placeholders in the text.

use std::collections::BTreeSet;

use crate::error::{BuildError, Result};
use crate::value::{ColumnValue, SqlValue};

/// Column holding the creation timestamp. Server-defaulted on insert and
/// never modified afterwards.
pub const CREATED_COLUMN: &str = "created";

/// Audit column appended on the create-with-audit path.
pub const CREATED_BY_COLUMN: &str = "createdby";

/// Quotes an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A statement ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Bound parameters, `params[n - 1]` belonging to `$n`.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Parameters in their textual form.
    #[must_use]
    pub fn param_strings(&self) -> Vec<String> {
        self.params.iter().map(SqlValue::to_param_string).collect()
    }
}

/// Columns to reset to their DEFAULT on the next update.
///
/// The set is handed to the update and emptied once the update succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullColumns(BTreeSet<String>);

impl NullColumns {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a column for reset.
    pub fn mark(&mut self, column: &str) {
        self.0.insert(column.to_lowercase());
    }

    /// Whether the column is marked.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(&column.to_lowercase())
    }

    /// Number of marked columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Marked columns in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Empties the set.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Tracks placeholder numbering while a statement is assembled.
#[derive(Debug, Default)]
struct Params {
    values: Vec<SqlValue>,
}

impl Params {
    /// Renders `value` into SQL: a fresh placeholder for bound values, the
    /// expression itself for raw ones.
    ///
    /// NULL is inlined since a typed parameter would not fit every column.
    fn push(&mut self, value: ColumnValue) -> String {
        match value {
            ColumnValue::Raw(expr) => expr,
            ColumnValue::Bound(SqlValue::Null) => String::from("NULL"),
            ColumnValue::Bound(value) => {
                self.values.push(value);
                format!("${}", self.values.len())
            }
        }
    }

    fn bind(&mut self, value: SqlValue) -> String {
        self.push(ColumnValue::Bound(value))
    }
}

fn is_created(column: &str) -> bool {
    column.eq_ignore_ascii_case(CREATED_COLUMN)
}

/// An INSERT builder.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<(String, ColumnValue)>,
    returning: Option<String>,
}

impl Insert {
    /// Starts an INSERT into `table`.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            returning: None,
        }
    }

    /// Adds a column. The `created` column is skipped.
    #[must_use]
    pub fn value(mut self, column: &str, value: ColumnValue) -> Self {
        if !is_created(column) {
            self.columns.push((column.to_lowercase(), value));
        }
        self
    }

    /// Adds the audit column.
    #[must_use]
    pub fn created_by(mut self, value: SqlValue) -> Self {
        self.columns
            .push((CREATED_BY_COLUMN.to_string(), ColumnValue::Bound(value)));
        self
    }

    /// Adds a `RETURNING` clause for the key column.
    #[must_use]
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_lowercase());
        self
    }

    /// Builds the statement.
    #[must_use]
    pub fn build(self) -> Statement {
        let mut params = Params::default();
        let mut sql = format!("INSERT INTO {}", self.table);

        if self.columns.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let mut names = Vec::with_capacity(self.columns.len());
            let mut values = Vec::with_capacity(self.columns.len());
            for (column, value) in self.columns {
                names.push(quote_identifier(&column));
                values.push(params.push(value));
            }
            sql.push_str(&format!(" ({}) VALUES ({})", names.join(", "), values.join(", ")));
        }

        if let Some(column) = self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&quote_identifier(&column));
        }

        Statement {
            sql,
            params: params.values,
        }
    }
}

/// An UPDATE builder keyed by one column.
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    assignments: Vec<(String, ColumnValue)>,
    resets: Vec<String>,
}

impl Update {
    /// Starts an UPDATE of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            resets: Vec::new(),
        }
    }

    /// Adds an assignment. The `created` column is skipped.
    #[must_use]
    pub fn set(mut self, column: &str, value: ColumnValue) -> Self {
        if !is_created(column) {
            self.assignments.push((column.to_lowercase(), value));
        }
        self
    }

    /// Resets every column in `nulls` to its DEFAULT. A column that also
    /// has an assignment keeps the assigned value.
    #[must_use]
    pub fn reset(mut self, nulls: &NullColumns) -> Self {
        self.resets
            .extend(nulls.iter().filter(|c| !is_created(c)).map(String::from));
        self
    }

    /// Builds the statement with `WHERE "<key>" = $n` as its last clause.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NothingToUpdate`] when neither assignments nor
    /// resets were given.
    pub fn build(self, key: &str, key_value: SqlValue) -> Result<Statement> {
        if self.assignments.is_empty() && self.resets.is_empty() {
            return Err(BuildError::NothingToUpdate { table: self.table });
        }

        let resets: Vec<String> = self
            .resets
            .iter()
            .filter(|column| !self.assignments.iter().any(|(assigned, _)| assigned == *column))
            .map(|column| format!("{} = DEFAULT", quote_identifier(column)))
            .collect();

        let mut params = Params::default();
        let mut set = Vec::with_capacity(self.assignments.len() + resets.len());
        for (column, value) in self.assignments {
            let rendered = params.push(value);
            set.push(format!("{} = {rendered}", quote_identifier(&column)));
        }
        set.extend(resets);

        let key_placeholder = params.bind(key_value);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {key_placeholder}",
            self.table,
            set.join(", "),
            quote_identifier(&key.to_lowercase()),
        );

        Ok(Statement {
            sql,
            params: params.values,
        })
    }
}

/// Builds `SELECT <exprs> FROM <table> WHERE "<key>" = $1`.
#[must_use]
pub fn select_by_key(table: &str, expressions: &[String], key: &str, key_value: SqlValue) -> Statement {
    let list = if expressions.is_empty() {
        String::from("*")
    } else {
        expressions.join(", ")
    };
    let mut params = Params::default();
    let key_placeholder = params.bind(key_value);
    Statement {
        sql: format!(
            "SELECT {list} FROM {table} WHERE {} = {key_placeholder}",
            quote_identifier(&key.to_lowercase())
        ),
        params: params.values,
    }
}

/// Builds `DELETE FROM <table> WHERE "<key>" = $1`.
#[must_use]
pub fn delete_by_key(table: &str, key: &str, key_value: SqlValue) -> Statement {
    let mut params = Params::default();
    let key_placeholder = params.bind(key_value);
    Statement {
        sql: format!(
            "DELETE FROM {table} WHERE {} = {key_placeholder}",
            quote_identifier(&key.to_lowercase())
        ),
        params: params.values,
    }
}
