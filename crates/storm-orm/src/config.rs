//! Connection settings.

use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::error::{Result, StormError};

/// Settings for connecting to a PostgreSQL server.
///
/// Built once and never modified afterwards. Every field has a default, so
/// a partial configuration file deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub username: String,
    /// Password, if the server asks for one.
    pub password: Option<String>,
    /// Database name.
    pub database: String,
    /// Logs statement failures at debug level instead of error level.
    pub quiet: bool,
    /// Pool size.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub acquire_timeout: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 5432,
            username: String::from("postgres"),
            password: None,
            database: String::from("postgres"),
            quiet: false,
            max_connections: 10,
            acquire_timeout: 5,
        }
    }
}

impl ConnectorConfig {
    /// Reads settings from `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`,
    /// `PGDATABASE` and `STORM_QUIET`, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Config`] when `PGPORT` is not a port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup("PGHOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            config.port = port
                .parse()
                .map_err(|_| StormError::Config(format!("invalid PGPORT: {port}")))?;
        }
        if let Some(username) = lookup("PGUSER") {
            config.username = username;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            config.password = Some(password);
        }
        if let Some(database) = lookup("PGDATABASE") {
            config.database = database;
        }
        if let Some(quiet) = lookup("STORM_QUIET") {
            config.quiet = matches!(quiet.as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// Converts to sqlx connect options.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Connection`] when the server cannot be reached.
    pub async fn connect(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout))
            .connect_with(self.connect_options())
            .await
            .map_err(|e| StormError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.host, "localhost");
        assert!(!config.quiet);
    }

    #[test]
    fn test_from_lookup() {
        let config = ConnectorConfig::from_lookup(lookup(&[
            ("PGHOST", "db.internal"),
            ("PGPORT", "6543"),
            ("PGUSER", "app"),
            ("PGPASSWORD", "secret"),
            ("PGDATABASE", "inventory"),
            ("STORM_QUIET", "true"),
        ]))
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.username, "app");
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.database, "inventory");
        assert!(config.quiet);
    }

    #[test]
    fn test_invalid_port() {
        let err = ConnectorConfig::from_lookup(lookup(&[("PGPORT", "abc")])).unwrap_err();
        assert!(matches!(err, StormError::Config(_)));
    }

    #[test]
    fn test_partial_json_config() {
        let config: ConnectorConfig =
            serde_json::from_str(r#"{"host": "pg", "quiet": true}"#).unwrap();
        assert_eq!(config.host, "pg");
        assert!(config.quiet);
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_connect_options() {
        let config = ConnectorConfig {
            host: "pg".into(),
            port: 6000,
            ..ConnectorConfig::default()
        };
        let options = config.connect_options();
        assert_eq!(options.get_host(), "pg");
        assert_eq!(options.get_port(), 6000);
        assert_eq!(options.get_database(), Some("postgres"));
    }
}
