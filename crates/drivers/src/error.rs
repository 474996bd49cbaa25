use derive_more::From;
use isodemo_core::ConfigError;

/// Errors from the `MySQL` and `PostgreSQL` drivers.
#[derive(Debug, From)]
pub enum Error {
    /// The configuration was rejected before connecting.
    #[from]
    Config(ConfigError),
    /// The connection URL could not be parsed.
    Options(sqlx::Error),
    /// Failed to connect to the server.
    Connection(sqlx::Error),
    /// A statement failed.
    Statement { sql: String, source: sqlx::Error },
}

impl Error {
    pub(crate) fn statement(sql: &str, source: sqlx::Error) -> Self {
        Self::Statement {
            sql: sql.to_owned(),
            source,
        }
    }
}
