//! # storm-core
//!
//! Schema and statement synthesis for PostgreSQL entities.
//!
//! This crate provides:
//! - [`Entity`] and [`Field`] descriptors, implemented by `#[derive(Entity)]`
//! - A type mapper from Rust field types to PostgreSQL column types, with
//!   [`CustomColumnType`] as the extension point
//! - [`ColumnValue`], which keeps bound parameters and inlined SQL
//!   expressions apart
//! - DDL text (CREATE TABLE, ADD COLUMN, CREATE SEQUENCE) and DML text
//!   (INSERT, UPDATE, SELECT, DELETE) with `$n` placeholders
//!
//! Nothing here talks to a database; `storm-orm` runs the statements.
//!
//! ## Example
//!
//! ```rust
//! use storm_core::{ColumnValue, SqlValue, Update};
//!
//! let stmt = Update::table("person")
//!     .set("name", ColumnValue::bound("Alice"))
//!     .set("location", ColumnValue::raw("ST_MakePoint(1,2)"))
//!     .build("id", SqlValue::Int(5))
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.sql,
//!     r#"UPDATE person SET "name" = $1, "location" = ST_MakePoint(1,2) WHERE "id" = $2"#
//! );
//! assert_eq!(stmt.param_strings(), vec!["Alice", "5"]);
//! ```

pub mod ddl;
pub mod dml;
pub mod entity;
pub mod error;
pub mod geography;
pub mod numeric;
pub mod types;
pub mod value;

pub use ddl::TableName;
pub use dml::{Insert, NullColumns, Statement, Update};
pub use entity::{is_excluded, Entity, Field};
pub use error::BuildError;
pub use geography::GeographyPoint;
pub use numeric::PostgresNumeric;
pub use types::{ColumnKind, ColumnType, CustomColumnType};
pub use value::{ColumnValue, RawSql, SqlValue, ToSqlValue};
