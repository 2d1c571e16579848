//! Fixed-precision `numeric(p,s)` columns.

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::{ColumnKind, ColumnType, CustomColumnType};
use crate::value::{ColumnValue, SqlValue};

/// A `numeric(precision, scale)` value.
///
/// Arithmetic with an absent operand leaves the left-hand side unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostgresNumeric {
    /// Total number of digits, including those right of the decimal point.
    pub precision: u32,
    /// Digits right of the decimal point.
    pub scale: u32,
    value: Option<Decimal>,
}

impl PostgresNumeric {
    /// Creates an absent numeric with the given precision and scale.
    #[must_use]
    pub const fn new(precision: u32, scale: u32) -> Self {
        Self {
            precision,
            scale,
            value: None,
        }
    }

    /// Sets the value.
    #[must_use]
    pub const fn with_value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> Option<Decimal> {
        self.value
    }

    /// Replaces the current value.
    pub fn set_value(&mut self, value: Option<Decimal>) {
        self.value = value;
    }

    /// Value rounded to the column scale, as text.
    #[must_use]
    pub fn string_value(&self) -> Option<String> {
        self.rounded().map(|d| d.to_string())
    }

    /// Loads the value from its textual database form. Unparseable text
    /// leaves the value absent.
    pub fn load(&mut self, text: &str) {
        self.value = Decimal::from_str(text.trim()).ok();
    }

    fn rounded(&self) -> Option<Decimal> {
        self.value.map(|d| {
            let mut d = d.round_dp(self.scale);
            d.rescale(self.scale);
            d
        })
    }

    fn combine(self, rhs: Option<Decimal>, op: impl FnOnce(Decimal, Decimal) -> Decimal) -> Self {
        match (self.value, rhs) {
            (Some(lhs), Some(rhs)) => Self {
                value: Some(op(lhs, rhs)),
                ..self
            },
            _ => self,
        }
    }
}

impl CustomColumnType for PostgresNumeric {
    fn sql_column_type(&self) -> String {
        format!("numeric({},{})", self.precision, self.scale)
    }

    fn render(&self) -> Option<ColumnValue> {
        self.rounded()
            .map(|d| ColumnValue::Bound(SqlValue::Numeric(d)))
    }

    fn default_literal(&self) -> Option<String> {
        self.string_value()
    }
}

impl ColumnType for PostgresNumeric {
    const KIND: ColumnKind = ColumnKind::Custom;

    fn column_value(&self) -> Option<ColumnValue> {
        self.render()
    }

    fn custom_type(&self) -> Option<&dyn CustomColumnType> {
        Some(self)
    }

    // Precision and scale live on the instance
    fn declared_sql_type() -> Option<String> {
        Some(String::from("numeric"))
    }
}

macro_rules! impl_ops {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for PostgresNumeric {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                self.combine(rhs.value, |a, b| a $op b)
            }
        }

        impl $trait<Decimal> for PostgresNumeric {
            type Output = Self;

            fn $method(self, rhs: Decimal) -> Self {
                self.combine(Some(rhs), |a, b| a $op b)
            }
        }

        impl $assign_trait for PostgresNumeric {
            fn $assign_method(&mut self, rhs: Self) {
                *self = self.combine(rhs.value, |a, b| a $op b);
            }
        }

        impl $assign_trait<Decimal> for PostgresNumeric {
            fn $assign_method(&mut self, rhs: Decimal) {
                *self = self.combine(Some(rhs), |a, b| a $op b);
            }
        }
    };
}

impl_ops!(Add, add, AddAssign, add_assign, +);
impl_ops!(Sub, sub, SubAssign, sub_assign, -);
impl_ops!(Mul, mul, MulAssign, mul_assign, *);
