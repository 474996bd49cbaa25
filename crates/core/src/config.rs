use core::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Server URL used when none is configured.
pub const DEFAULT_URL: &str = "mysql://root@localhost:3306";
/// Database the harness drops and recreates.
pub const DEFAULT_DATABASE: &str = "anomaly_test";

/// Where the demonstrations run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection string. Any database in its path is only used for
    /// the bootstrap connection.
    pub url: String,
    /// Name of the scratch database. It is dropped on every bootstrap.
    pub database: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            database: DEFAULT_DATABASE.to_owned(),
        }
    }
}

/// Database engines with a driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    MySql,
    Postgres,
}

impl Display for Engine {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::MySql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Error in a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The URL has no `scheme://` prefix.
    MissingScheme(String),
    /// The URL scheme names an engine without a driver.
    UnsupportedScheme(String),
    /// The database name is empty or not a plain identifier. It is spliced
    /// into `DROP DATABASE`, so only `[A-Za-z0-9_]` is accepted.
    InvalidDatabaseName(String),
}

impl Config {
    #[must_use]
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
        }
    }

    /// Pick the engine from the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no scheme or the scheme is unknown.
    pub fn engine(&self) -> Result<Engine, ConfigError> {
        let (scheme, _) = self
            .url
            .split_once("://")
            .ok_or_else(|| ConfigError::MissingScheme(self.url.clone()))?;

        match scheme.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Engine::MySql),
            "postgres" | "postgresql" => Ok(Engine::Postgres),
            _ => Err(ConfigError::UnsupportedScheme(scheme.to_owned())),
        }
    }

    /// Check the configuration before any statement is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Self::engine`] fails or the database name is not
    /// a plain identifier.
    pub fn validate(&self) -> Result<Engine, ConfigError> {
        let engine = self.engine()?;

        let valid = !self.database.is_empty()
            && self
                .database
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !valid {
            return Err(ConfigError::InvalidDatabaseName(self.database.clone()));
        }

        Ok(engine)
    }
}
