//! `PostgreSQL` driver.
//!
//! `PostgreSQL` accepts `READ UNCOMMITTED` but runs it as `READ COMMITTED`,
//! so the first scenario shows no dirty read here. Its repeatable read is
//! snapshot isolation, which keeps the third scenario's row hidden just like
//! `MySQL` does.

use std::str::FromStr;

use isodemo_core::{
    Backend, Config, IsolationLevel, ParamStyle, Statement, TxSession, CREATE_TABLE, DELETE_ALL,
};
use sqlx::postgres::{PgConnectOptions, PgConnection, Postgres};
use sqlx::{Connection, Executor};

use crate::{quote_ident, Error};

const PARAMS: ParamStyle = ParamStyle::Numbered;

/// Driver for `PostgreSQL`.
///
/// The bootstrap connection uses whatever database the URL names (or the
/// server's default for the user); it must not be the scratch database.
#[derive(Debug, Clone)]
pub struct PgBackend {
    server: PgConnectOptions,
    target: PgConnectOptions,
    database: String,
}

impl PgBackend {
    /// Parse the connection options. Nothing is sent to the server yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the URL cannot be
    /// parsed.
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let server = PgConnectOptions::from_str(&config.url).map_err(Error::Options)?;
        let target = server.clone().database(&config.database);

        Ok(Self {
            server,
            target,
            database: config.database.clone(),
        })
    }

    async fn connect(options: &PgConnectOptions) -> Result<PgConnection, Error> {
        PgConnection::connect_with(options)
            .await
            .map_err(Error::Connection)
    }
}

/// Run `sql` over the simple query protocol.
async fn run(conn: &mut PgConnection, sql: &str) -> Result<u64, Error> {
    conn.execute(sql)
        .await
        .map(|done| done.rows_affected())
        .map_err(|source| Error::statement(sql, source))
}

fn begin_sql(level: Option<IsolationLevel>) -> String {
    level.map_or_else(
        || "BEGIN".to_owned(),
        |level| format!("BEGIN ISOLATION LEVEL {}", level.as_sql()),
    )
}

impl Backend for PgBackend {
    type Error = Error;
    type Connection = PgConnection;
    type Session = PgSession;

    fn name(&self) -> &'static str {
        "postgres"
    }

    fn permits_dirty_reads(&self) -> bool {
        false
    }

    async fn bootstrap(&self) -> Result<(), Error> {
        let database = quote_ident(&self.database, '"');

        // DROP/CREATE DATABASE cannot run inside a transaction block; the
        // simple protocol sends each as its own implicit transaction. FORCE
        // (PostgreSQL 13+) ends backends of earlier runs still shutting down.
        let mut conn = Self::connect(&self.server).await?;
        run(
            &mut conn,
            &format!("DROP DATABASE IF EXISTS {database} WITH (FORCE)"),
        )
        .await?;
        run(&mut conn, &format!("CREATE DATABASE {database}")).await?;
        conn.close().await.map_err(Error::Connection)?;

        let mut conn = Self::connect(&self.target).await?;
        run(&mut conn, CREATE_TABLE).await?;
        conn.close().await.map_err(Error::Connection)?;

        tracing::debug!(database = %self.database, "recreated database");
        Ok(())
    }

    async fn reset(&self) -> Result<PgConnection, Error> {
        let mut conn = Self::connect(&self.target).await?;
        run(&mut conn, "BEGIN").await?;
        let deleted = run(&mut conn, DELETE_ALL).await?;
        run(&mut conn, "COMMIT").await?;

        tracing::debug!(deleted, "emptied table");
        Ok(conn)
    }

    async fn begin(
        &self,
        mut conn: PgConnection,
        level: Option<IsolationLevel>,
    ) -> Result<PgSession, Error> {
        run(&mut conn, &begin_sql(level)).await?;
        Ok(PgSession { conn })
    }
}

/// An open `PostgreSQL` transaction on its own connection.
#[derive(Debug)]
pub struct PgSession {
    conn: PgConnection,
}

impl TxSession for PgSession {
    type Error = Error;

    async fn execute(&mut self, stmt: Statement) -> Result<u64, Error> {
        let sql = stmt.sql(PARAMS);
        let mut query = sqlx::query::<Postgres>(sql);
        if let Some(value) = stmt.param() {
            query = query.bind(value);
        }

        query
            .execute(&mut self.conn)
            .await
            .map(|done| done.rows_affected())
            .map_err(|source| Error::statement(sql, source))
    }

    async fn fetch(&mut self, stmt: Statement) -> Result<Option<i32>, Error> {
        let sql = stmt.sql(PARAMS);
        let mut query = sqlx::query_scalar::<Postgres, i32>(sql);
        if let Some(value) = stmt.param() {
            query = query.bind(value);
        }

        query
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|source| Error::statement(sql, source))
    }

    async fn commit(&mut self) -> Result<(), Error> {
        run(&mut self.conn, "COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), Error> {
        run(&mut self.conn, "ROLLBACK").await?;
        Ok(())
    }

    async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Connection)
    }
}
