//! Connection configuration, read once at process start.
//!
//! Either `DATABASE_URL` or the discrete `PG_*` variables:
//!
//! | Variable             | Default     |
//! |----------------------|-------------|
//! | `PG_HOST`            | `localhost` |
//! | `PG_PORT`            | `5432`      |
//! | `PG_USER`            | `postgres`  |
//! | `PG_PASSWORD`        | (empty)     |
//! | `PG_DB`              | `books`     |
//! | `PG_SSL_MODE`        | `prefer`    |
//! | `PG_MAX_CONNECTIONS` | `20`        |
//! | `PG_MIN_CONNECTIONS` | `10`        |

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::DbError;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_MIN_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct DbConfig {
    /// Full connection string; overrides the discrete fields when set.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: PgSslMode,
    /// Ceiling on simultaneously open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "books".to_string(),
            ssl_mode: PgSslMode::Prefer,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl DbConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            url: var("DATABASE_URL"),
            host: var("PG_HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "PG_PORT", defaults.port)?,
            user: var("PG_USER").unwrap_or(defaults.user),
            password: lookup("PG_PASSWORD").unwrap_or(defaults.password),
            database: var("PG_DB").unwrap_or(defaults.database),
            ssl_mode: match var("PG_SSL_MODE") {
                Some(mode) => PgSslMode::from_str(mode.trim())
                    .map_err(|_| DbError::Config(format!("PG_SSL_MODE: unknown ssl mode '{mode}'")))?,
                None => defaults.ssl_mode,
            },
            max_connections: parse_var(&var, "PG_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_var(&var, "PG_MIN_CONNECTIONS", defaults.min_connections)?,
        };

        if config.max_connections == 0 {
            return Err(DbError::Config("PG_MAX_CONNECTIONS must be at least 1".into()));
        }
        if config.min_connections > config.max_connections {
            return Err(DbError::Config(format!(
                "PG_MIN_CONNECTIONS ({}) exceeds PG_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            )));
        }

        Ok(config)
    }

    /// Driver options for this configuration.
    ///
    /// `standard_conforming_strings` is always switched on so backslashes in
    /// string literals are never treated as escapes.
    pub fn connect_options(&self) -> Result<PgConnectOptions, DbError> {
        let options = match &self.url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| DbError::Config(format!("DATABASE_URL: {e}")))?,
            None => PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.database)
                .ssl_mode(self.ssl_mode),
        };

        Ok(options.options([("standard_conforming_strings", "on")]))
    }
}

fn parse_var<T, V>(var: &V, key: &str, default: T) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DbError::Config(format!("{key}: invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<DbConfig, DbError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DbConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 10);
        assert!(config.url.is_none());
    }

    #[test]
    fn reads_pg_variables() {
        let config = config_from(&[
            ("PG_HOST", "db.internal"),
            ("PG_PORT", "6543"),
            ("PG_USER", "books"),
            ("PG_PASSWORD", "secret"),
            ("PG_DB", "library"),
            ("PG_SSL_MODE", "disable"),
        ])
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.user, "books");
        assert_eq!(config.password, "secret");
        assert_eq!(config.database, "library");
        assert!(matches!(config.ssl_mode, PgSslMode::Disable));
    }

    #[test]
    fn rejects_bad_port_and_ssl_mode() {
        assert!(matches!(config_from(&[("PG_PORT", "abc")]), Err(DbError::Config(_))));
        assert!(matches!(
            config_from(&[("PG_SSL_MODE", "sometimes")]),
            Err(DbError::Config(_))
        ));
    }

    #[test]
    fn rejects_min_above_max() {
        let err = config_from(&[("PG_MAX_CONNECTIONS", "4"), ("PG_MIN_CONNECTIONS", "5")]);
        assert!(matches!(err, Err(DbError::Config(_))));
    }

    #[test]
    fn debug_output_hides_password() {
        let config = config_from(&[("PG_PASSWORD", "hunter2")]).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn invalid_database_url_is_a_config_error() {
        let config = config_from(&[("DATABASE_URL", "not a url")]).unwrap();
        assert!(matches!(config.connect_options(), Err(DbError::Config(_))));
    }
}
