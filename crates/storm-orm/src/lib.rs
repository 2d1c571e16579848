//! # storm-orm
//!
//! PostgreSQL schema synthesis and persistence for storm entities.
//!
//! This crate provides:
//! - The [`Executor`] boundary and [`PgExecutor`], its sqlx implementation
//! - [`setup`], which creates a missing table or adds missing columns
//! - [`Persist`], which saves, creates, updates, finds and deletes entities
//! - [`ConnectorConfig`] for connection settings
//!
//! ## Quick Start
//!
//! ```ignore
//! use storm_orm::{ConnectorConfig, Entity, NullColumns, Persist, PgExecutor, SetupOptions};
//!
//! #[derive(Entity)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     age: Option<i64>,
//! }
//!
//! async fn example() -> storm_orm::Result<()> {
//!     let exec = PgExecutor::connect(&ConnectorConfig::from_env()?).await?;
//!
//!     let person = Person { id: 0, name: "Alice".into(), age: None };
//!     storm_orm::setup(&exec, &person, &SetupOptions::new()).await?;
//!
//!     let mut nulls = NullColumns::new();
//!     let id = person.save(&exec, &mut nulls).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod persist;
pub mod schema;

pub use config::ConnectorConfig;
pub use error::{Result, StormError};
pub use executor::{Executor, PgExecutor, Row};
pub use persist::{insert_statement, update_statement, Persist};
pub use schema::{run_raw, setup, setup_table, SetupOptions, SetupReport};

pub use storm_core::{
    ColumnValue, CustomColumnType, Entity, Field, GeographyPoint, NullColumns, PostgresNumeric,
    RawSql, SqlValue, TableName,
};
pub use storm_derive::Entity;
