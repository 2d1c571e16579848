//! Entity and field descriptors.
//!
//! The `#[derive(Entity)]` macro implements [`Entity`] for a struct by
//! listing its mapped fields in declaration order. Names starting with
//! `internal_` or `_` are left out, and the first remaining field is the
//! primary key.

use crate::ddl::TableName;
use crate::types::{ColumnKind, ColumnType, CustomColumnType};
use crate::value::{ColumnValue, SqlValue};

/// One mapped column of an entity instance.
pub struct Field<'a> {
    /// Declared field name.
    pub name: &'static str,
    /// Semantic kind of the field's type.
    pub kind: ColumnKind,
    /// Rendered value, `None` when absent.
    pub value: Option<ColumnValue>,
    /// Custom column type of the current value, if any.
    pub custom: Option<&'a dyn CustomColumnType>,
    /// Column type fixed by the Rust type, used when there is no value to
    /// ask.
    pub declared_type: Option<String>,
    /// Whether this is the primary key.
    pub primary_key: bool,
}

impl<'a> Field<'a> {
    /// Describes a field holding `value`.
    pub fn new<T: ColumnType>(name: &'static str, value: &'a T, primary_key: bool) -> Self {
        Self {
            name,
            kind: T::KIND,
            value: value.column_value(),
            custom: value.custom_type(),
            declared_type: T::declared_sql_type(),
            primary_key,
        }
    }

    /// Describes a field rendered through its `Display` implementation.
    pub fn display<T: std::fmt::Display + ?Sized>(
        name: &'static str,
        value: &T,
        primary_key: bool,
    ) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
            value: crate::types::display_value(value),
            custom: None,
            declared_type: None,
            primary_key,
        }
    }

    /// Rendered value of this field, `None` when absent.
    #[must_use]
    pub fn render(&self) -> Option<ColumnValue> {
        self.value.clone()
    }

    /// Column name as rendered into SQL.
    #[must_use]
    pub fn column_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// SQL column type, custom types taking precedence over the built-in
    /// table.
    #[must_use]
    pub fn sql_type(&self) -> String {
        match (self.custom, &self.declared_type) {
            (Some(custom), _) => custom.sql_column_type(),
            (None, Some(declared)) => declared.clone(),
            (None, None) => self.kind.default_sql_type(self.primary_key).to_string(),
        }
    }

    /// Whether the column can be backed by an integer sequence.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.custom.is_none() && self.kind == ColumnKind::Integer
    }

    /// Expression used to read this column back in a SELECT list.
    #[must_use]
    pub fn select_expression(&self) -> String {
        let column = self.column_name();
        match self.custom {
            Some(custom) => custom.select_expression(&column, None),
            None => column,
        }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("custom", &self.custom.map(|custom| custom.sql_column_type()))
            .field("declared_type", &self.declared_type)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

/// Whether a declared field name is kept out of schema and statements.
#[must_use]
pub fn is_excluded(name: &str) -> bool {
    name.starts_with("internal_") || name.starts_with('_')
}

/// A record type mapped to one table.
///
/// # Example
///
/// ```ignore
/// use storm_derive::Entity;
///
/// #[derive(Entity)]
/// struct Person {
///     id: i64,
///     name: String,
///     age: Option<i64>,
///     internal_cache: Vec<u8>,
/// }
///
/// assert_eq!(Person::TABLE, "person");
/// assert_eq!(Person::COLUMNS, &["id", "name", "age"]);
/// ```
pub trait Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Mapped column names in declaration order.
    const COLUMNS: &'static [&'static str];

    /// Schema holding the table, the connection's current schema when
    /// `None`.
    const SCHEMA: Option<&'static str> = None;

    /// Mapped fields of this instance in declaration order, the primary key
    /// first.
    fn fields(&self) -> Vec<Field<'_>>;

    /// Table name.
    #[must_use]
    fn table_name() -> &'static str
    where
        Self: Sized,
    {
        Self::TABLE
    }

    /// `schema.table`, or just the table name without a schema.
    #[must_use]
    fn qualified_table() -> String
    where
        Self: Sized,
    {
        TableName::new(Self::TABLE)
            .in_schema(Self::SCHEMA)
            .qualified()
    }

    /// Mapped column names in declaration order.
    #[must_use]
    fn column_names() -> &'static [&'static str]
    where
        Self: Sized,
    {
        Self::COLUMNS
    }

    /// Name and current value of the primary key.
    fn primary_key(&self) -> Option<(String, Option<SqlValue>)> {
        self.fields().into_iter().next().map(|field| {
            let name = field.column_name();
            let value = field.value.and_then(|v| match v {
                ColumnValue::Bound(value) => Some(value),
                ColumnValue::Raw(_) => None,
            });
            (name, value)
        })
    }

    /// Whether the primary key still has to be generated by the database.
    fn key_is_empty(&self) -> bool {
        match self.primary_key() {
            Some((_, Some(value))) => value.is_empty_key(),
            _ => true,
        }
    }
}
