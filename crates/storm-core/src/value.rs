//! SQL values and the bound/raw split used by the statement builders.
//!
//! Every value headed for a statement is either a [`SqlValue`] that travels
//! as a positional parameter, or a raw SQL expression that is spliced into
//! the statement text. The split is carried by [`ColumnValue`] so that no
//! string ever has to be inspected to decide which channel it belongs to.

use rust_decimal::Decimal;

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary value (`bytea`).
    Bytes(Vec<u8>),
    /// JSON document (`jsonb`).
    Json(serde_json::Value),
    /// Fixed-precision decimal (`numeric`).
    Numeric(Decimal),
}

impl SqlValue {
    /// Returns the textual form of this value as it appears in the
    /// parameter list of a statement.
    ///
    /// `Null` renders as the literal token `null`.
    #[must_use]
    pub fn to_param_string(&self) -> String {
        match self {
            Self::Null => String::from("null"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
                format!("\\x{hex}")
            }
            Self::Json(v) => v.to_string(),
            Self::Numeric(d) => d.to_string(),
        }
    }

    /// Returns the value as an inline SQL literal usable in a `DEFAULT`
    /// clause. Only integers have one.
    #[must_use]
    pub fn to_default_literal(&self) -> Option<String> {
        match self {
            Self::Int(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether this value counts as "no key yet" when it sits in a primary
    /// key column.
    #[must_use]
    pub fn is_empty_key(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Int(n) => *n == 0,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// A value positioned in a statement: bound as a parameter, or inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Travels as a `$n` parameter.
    Bound(SqlValue),
    /// Spliced verbatim into the statement text.
    Raw(String),
}

impl ColumnValue {
    /// Creates a bound value.
    pub fn bound<T: ToSqlValue>(value: T) -> Self {
        Self::Bound(value.to_sql_value())
    }

    /// Creates a raw SQL expression.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Whether this value is inlined rather than bound.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Returns the bound value, if any.
    #[must_use]
    pub const fn as_bound(&self) -> Option<&SqlValue> {
        match self {
            Self::Bound(v) => Some(v),
            Self::Raw(_) => None,
        }
    }
}

impl From<SqlValue> for ColumnValue {
    fn from(value: SqlValue) -> Self {
        Self::Bound(value)
    }
}

/// A raw SQL expression held by an entity field.
///
/// The expression is inlined at its column position in INSERT and UPDATE
/// statements. It is never escaped, so it must not carry user input.
///
/// ```
/// use storm_core::{ColumnType, ColumnValue, RawSql};
///
/// let now = RawSql::new("now()");
/// assert_eq!(now.column_value(), Some(ColumnValue::raw("now()")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSql(String);

impl RawSql {
    /// Wraps a SQL expression.
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Returns the expression text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for &SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self.clone()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Decimal {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Numeric(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bytes(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
