//! DDL text for creating and extending entity tables.
//!
//! These functions only build statements. Deciding which of them to run
//! against a live database is the job of the schema synthesizer in
//! `storm-orm`.

use crate::entity::Field;
use crate::error::{BuildError, Result};

/// A table name, optionally qualified by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Creates a table name in the connection's current schema.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
        }
    }

    /// Places the table in `schema`.
    #[must_use]
    pub fn in_schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    /// Schema, if one was given.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Bare table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `schema.table`, or just `table` without a schema.
    #[must_use]
    pub fn qualified(&self) -> String {
        self.qualify(&self.table)
    }

    /// Name of the sequence backing an auto-increment key.
    #[must_use]
    pub fn sequence(&self) -> String {
        format!("{}_id_seq", self.table)
    }

    /// Qualified name of the sequence backing an auto-increment key.
    #[must_use]
    pub fn qualified_sequence(&self) -> String {
        self.qualify(&self.sequence())
    }

    fn qualify(&self, name: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{name}"),
            None => name.to_string(),
        }
    }
}

/// Builds the statement creating the auto-increment sequence.
#[must_use]
pub fn create_sequence_sql(table: &TableName) -> String {
    let mut sql = format!("CREATE SEQUENCE {} ", table.qualified_sequence());
    sql.push_str("INCREMENT 1 ");
    sql.push_str("START 1 ");
    sql.push_str("MINVALUE 1 ");
    sql.push_str("MAXVALUE 9223372036854775807 ");
    sql.push_str("CACHE 1;");
    sql
}

/// Whether the auto-increment option applies to these fields.
///
/// Only an integer primary key can be backed by a sequence.
#[must_use]
pub fn uses_sequence(fields: &[Field<'_>], auto_increment_pk: bool) -> bool {
    auto_increment_pk && fields.first().is_some_and(Field::is_integer)
}

/// Builds one column definition of a CREATE TABLE statement.
#[must_use]
pub fn column_definition(field: &Field<'_>, table: &TableName, auto_increment_pk: bool) -> String {
    let name = field.column_name();
    if field.primary_key && auto_increment_pk && field.is_integer() {
        return format!(
            "{name} integer NOT NULL DEFAULT nextval('{}'::regclass)",
            table.qualified_sequence()
        );
    }
    if field.primary_key {
        return format!("{name} {} NOT NULL", field.sql_type());
    }
    format!("{name} {}", field.sql_type())
}

/// Builds the CREATE TABLE statement for `fields`.
///
/// The primary key constraint names the first field. It is left out when
/// the key is backed by a sequence.
///
/// # Errors
///
/// Returns [`BuildError::NoColumns`] when there is nothing to create.
pub fn create_table_sql(
    table: &TableName,
    fields: &[Field<'_>],
    auto_increment_pk: bool,
) -> Result<String> {
    let key = fields.first().ok_or_else(|| BuildError::NoColumns {
        table: table.qualified(),
    })?;
    let sequenced = uses_sequence(fields, auto_increment_pk);

    let columns: Vec<String> = fields
        .iter()
        .map(|field| column_definition(field, table, sequenced))
        .collect();

    let key_component = if sequenced {
        String::new()
    } else {
        format!(
            ", CONSTRAINT {}_key PRIMARY KEY ({}) NOT DEFERRABLE INITIALLY IMMEDIATE",
            table.table(),
            key.column_name()
        )
    };

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}{key_component});",
        table.qualified(),
        columns.join(", ")
    ))
}

/// Builds the ALTER TABLE statement adding one missing column.
///
/// Integer columns whose field currently holds a value become `NOT NULL`
/// with that value as default, so existing rows get filled. Custom types
/// supply their own default literal.
#[must_use]
pub fn add_column_sql(table: &TableName, field: &Field<'_>) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table.qualified(),
        field.column_name(),
        field.sql_type()
    );

    if let Some(custom) = field.custom {
        if let Some(literal) = custom.default_literal() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&literal);
        }
    } else if field.is_integer() && !field.primary_key {
        let literal = field
            .value
            .as_ref()
            .and_then(|value| value.as_bound())
            .and_then(crate::value::SqlValue::to_default_literal);
        if let Some(literal) = literal {
            sql.push_str(" NOT NULL DEFAULT ");
            sql.push_str(&literal);
        }
    }

    sql
}
