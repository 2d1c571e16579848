//! Error types for the ORM.

use storm_core::BuildError;
use thiserror::Error;

/// SQLSTATE raised for a duplicate key.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised for a missing relation.
pub const UNDEFINED_TABLE: &str = "42P01";

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum StormError {
    /// The database could not be reached or the pool gave up.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected a statement.
    #[error("query error: {message}")]
    Query {
        /// Server message.
        message: String,
        /// SQLSTATE code, when the server sent one.
        code: Option<String>,
    },

    /// A schema statement failed.
    #[error("schema error in `{statement}`: {message}")]
    Schema {
        /// The DDL that failed.
        statement: String,
        /// Why it failed.
        message: String,
    },

    /// No row matched the key.
    #[error("object not found")]
    NotFound,

    /// Statement construction error.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Invalid connection settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StormError {
    /// SQLSTATE code of a server-side failure.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether a unique constraint was violated.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.code() == Some(UNIQUE_VIOLATION)
    }

    /// Whether the statement referenced a table that does not exist.
    #[must_use]
    pub fn is_undefined_table(&self) -> bool {
        self.code() == Some(UNDEFINED_TABLE)
    }
}

impl From<sqlx::Error> for StormError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => Self::Query {
                message: db.message().to_string(),
                code: db.code().map(|code| code.into_owned()),
            },
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Configuration(e) => Self::Config(e.to_string()),
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => Self::Connection(e.to_string()),
            e => Self::Query {
                message: e.to_string(),
                code: None,
            },
        }
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, StormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            StormError::from(sqlx::Error::RowNotFound),
            StormError::NotFound
        ));
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        assert!(matches!(
            StormError::from(sqlx::Error::PoolTimedOut),
            StormError::Connection(_)
        ));
    }

    #[test]
    fn test_code_classification() {
        let err = StormError::Query {
            message: "duplicate key value violates unique constraint".into(),
            code: Some(UNIQUE_VIOLATION.into()),
        };
        assert!(err.is_unique_violation());
        assert!(!err.is_undefined_table());
        assert_eq!(StormError::NotFound.code(), None);
    }

    #[test]
    fn test_build_error_converts() {
        let err: StormError = BuildError::NothingToUpdate {
            table: "person".into(),
        }
        .into();
        assert!(matches!(err, StormError::Build(_)));
    }
}
