//! Database drivers for running the isolation demonstrations against real
//! servers.
//!
//! Each driver implements [`isodemo_core::Backend`] on top of `sqlx`. Every
//! session gets a dedicated connection, and transaction control is issued
//! as plain SQL so the isolation level can be set exactly where the engine
//! expects it.

use isodemo_core::{Config, Engine};

pub mod error;
pub mod mysql;
pub mod postgres;

pub use error::Error;
pub use mysql::MySqlBackend;
pub use postgres::PgBackend;

/// Either driver, chosen from the configured URL.
#[derive(Debug)]
pub enum AnyBackend {
    MySql(MySqlBackend),
    Postgres(PgBackend),
}

impl AnyBackend {
    /// Build the driver matching the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the URL cannot be
    /// parsed by the driver.
    pub fn new(config: &Config) -> Result<Self, Error> {
        match config.validate()? {
            Engine::MySql => MySqlBackend::new(config).map(Self::MySql),
            Engine::Postgres => PgBackend::new(config).map(Self::Postgres),
        }
    }
}

/// Quote `name` as an identifier for DDL. Names are validated by
/// [`Config::validate`] before they get here.
fn quote_ident(name: &str, quote: char) -> String {
    format!("{quote}{name}{quote}")
}
