//! Mapping from Rust field types to PostgreSQL column types.
//!
//! Each field type implements [`ColumnType`], which names its semantic
//! [`ColumnKind`] and renders its runtime value. Types that need a column
//! type outside the built-in table (fixed-precision numerics, PostGIS
//! points) also implement [`CustomColumnType`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::value::{ColumnValue, RawSql, SqlValue};

/// Semantic kind of a column, before any custom override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Signed integer of any width.
    Integer,
    /// Unsigned integer of any width.
    Unsigned,
    /// Boolean.
    Boolean,
    /// Text.
    Text,
    /// Sequence of text, integers or JSON values.
    Sequence,
    /// String-keyed map, stored as a JSON document.
    Map,
    /// Floating point of any width.
    Float,
    /// Raw bytes.
    Bytes,
    /// A type implementing [`CustomColumnType`].
    Custom,
}

impl ColumnKind {
    /// Returns the built-in SQL type for this kind.
    ///
    /// Integer primary keys become `serial`. A custom kind reaching this
    /// table (its value is absent, so there is no instance to ask) maps to
    /// `text`, like anything else unrecognized.
    #[must_use]
    pub const fn default_sql_type(self, primary_key: bool) -> &'static str {
        match self {
            Self::Integer if primary_key => "serial",
            Self::Integer => "int8",
            Self::Boolean => "bool",
            Self::Text | Self::Sequence | Self::Custom => "text",
            Self::Map => "jsonb",
            Self::Unsigned | Self::Bytes => "bytea",
            Self::Float => "float8",
        }
    }
}

/// A field type that supplies its own column type and rendering.
pub trait CustomColumnType {
    /// The SQL type used in CREATE TABLE and ADD COLUMN, verbatim.
    fn sql_column_type(&self) -> String;

    /// Renders the current value; `None` when the value is absent.
    fn render(&self) -> Option<ColumnValue>;

    /// Literal for the `DEFAULT` clause when the column is added to an
    /// existing table.
    fn default_literal(&self) -> Option<String> {
        None
    }

    /// Expression used to read the column back in a SELECT list.
    fn select_expression(&self, column: &str, alias: Option<&str>) -> String {
        let column = column.to_lowercase();
        match alias {
            Some(alias) => format!("{column} AS {alias}"),
            None => column,
        }
    }
}

/// A Rust type that can sit in an entity field.
pub trait ColumnType {
    /// Semantic kind used when no custom type is available.
    const KIND: ColumnKind;

    /// Renders the runtime value; `None` when the value is absent.
    fn column_value(&self) -> Option<ColumnValue>;

    /// Returns the custom type capability, if this type has one.
    fn custom_type(&self) -> Option<&dyn CustomColumnType> {
        None
    }

    /// Column type that holds for every value of this type, absent ones
    /// included.
    fn declared_sql_type() -> Option<String> {
        None
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl ColumnType for $ty {
                const KIND: ColumnKind = ColumnKind::Integer;

                fn column_value(&self) -> Option<ColumnValue> {
                    Some(ColumnValue::Bound(SqlValue::Int(i64::from(*self))))
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl ColumnType for $ty {
                const KIND: ColumnKind = ColumnKind::Unsigned;

                fn column_value(&self) -> Option<ColumnValue> {
                    Some(ColumnValue::Bound(SqlValue::Bytes(self.to_be_bytes().to_vec())))
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32);
impl_unsigned!(u8, u16, u32, u64, usize);

impl ColumnType for i64 {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Int(*self)))
    }
}

impl ColumnType for isize {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn column_value(&self) -> Option<ColumnValue> {
        i64::try_from(*self)
            .ok()
            .map(|n| ColumnValue::Bound(SqlValue::Int(n)))
    }
}

impl ColumnType for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Bool(*self)))
    }
}

impl ColumnType for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Text(self.clone())))
    }
}

impl ColumnType for f32 {
    const KIND: ColumnKind = ColumnKind::Float;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Float(f64::from(*self))))
    }
}

impl ColumnType for f64 {
    const KIND: ColumnKind = ColumnKind::Float;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Float(*self)))
    }
}

impl ColumnType for Vec<u8> {
    const KIND: ColumnKind = ColumnKind::Bytes;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Bytes(self.clone())))
    }
}

// Sequences are stored as their JSON text in a `text` column.
macro_rules! impl_sequence {
    ($($ty:ty),*) => {
        $(
            impl ColumnType for $ty {
                const KIND: ColumnKind = ColumnKind::Sequence;

                fn column_value(&self) -> Option<ColumnValue> {
                    serde_json::to_string(self)
                        .ok()
                        .map(|text| ColumnValue::Bound(SqlValue::Text(text)))
                }
            }
        )*
    };
}

impl_sequence!(Vec<String>, Vec<i64>, Vec<i32>, Vec<serde_json::Value>);

impl<S: std::hash::BuildHasher> ColumnType for HashMap<String, serde_json::Value, S> {
    const KIND: ColumnKind = ColumnKind::Map;

    fn column_value(&self) -> Option<ColumnValue> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(ColumnValue::Bound(SqlValue::Json(serde_json::Value::Object(map))))
    }
}

impl ColumnType for BTreeMap<String, serde_json::Value> {
    const KIND: ColumnKind = ColumnKind::Map;

    fn column_value(&self) -> Option<ColumnValue> {
        let map = self.clone().into_iter().collect();
        Some(ColumnValue::Bound(SqlValue::Json(serde_json::Value::Object(map))))
    }
}

impl ColumnType for serde_json::Map<String, serde_json::Value> {
    const KIND: ColumnKind = ColumnKind::Map;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Json(serde_json::Value::Object(
            self.clone(),
        ))))
    }
}

impl ColumnType for serde_json::Value {
    const KIND: ColumnKind = ColumnKind::Map;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Json(self.clone())))
    }
}

// Timestamps fall in the "unrecognized" row of the table and are stored as
// text in their ISO-8601 form.
impl ColumnType for DateTime<Utc> {
    const KIND: ColumnKind = ColumnKind::Text;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Text(self.to_rfc3339())))
    }
}

impl ColumnType for NaiveDateTime {
    const KIND: ColumnKind = ColumnKind::Text;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Text(
            self.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        )))
    }
}

impl ColumnType for NaiveDate {
    const KIND: ColumnKind = ColumnKind::Text;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Bound(SqlValue::Text(
            self.format("%Y-%m-%d").to_string(),
        )))
    }
}

impl ColumnType for RawSql {
    const KIND: ColumnKind = ColumnKind::Text;

    fn column_value(&self) -> Option<ColumnValue> {
        Some(ColumnValue::Raw(self.as_str().to_string()))
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    const KIND: ColumnKind = T::KIND;

    fn column_value(&self) -> Option<ColumnValue> {
        self.as_ref().and_then(ColumnType::column_value)
    }

    fn custom_type(&self) -> Option<&dyn CustomColumnType> {
        self.as_ref().and_then(ColumnType::custom_type)
    }

    fn declared_sql_type() -> Option<String> {
        T::declared_sql_type()
    }
}

/// Renders any `Display` value as bound text.
///
/// Used by `#[column(display)]` fields whose type has no [`ColumnType`]
/// implementation.
pub fn display_value<T: std::fmt::Display + ?Sized>(value: &T) -> Option<ColumnValue> {
    Some(ColumnValue::Bound(SqlValue::Text(value.to_string())))
}
