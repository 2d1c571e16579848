//! Error types for statement building.

use thiserror::Error;

/// Errors raised while assembling a statement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// CREATE TABLE for an entity without mapped fields.
    #[error("table {table} has no mapped columns")]
    NoColumns {
        /// Table name.
        table: String,
    },

    /// UPDATE without any assignment or reset.
    #[error("nothing to update in table {table}")]
    NothingToUpdate {
        /// Table name.
        table: String,
    },

    /// The entity has no primary key value to address a row with.
    #[error("table {table} has no primary key value")]
    MissingKey {
        /// Table name.
        table: String,
    },
}

/// Result type alias for statement building.
pub type Result<T> = std::result::Result<T, BuildError>;
