//! `MySQL`/`MariaDB` driver. This is the engine the demonstrations were
//! written for: `READ UNCOMMITTED` exposes dirty reads and the default level
//! is `REPEATABLE READ`.

use std::str::FromStr;

use isodemo_core::{
    Backend, Config, IsolationLevel, ParamStyle, Statement, TxSession, CREATE_TABLE, DELETE_ALL,
};
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

use crate::{quote_ident, Error};

const PARAMS: ParamStyle = ParamStyle::QuestionMark;

/// Driver for `MySQL` and `MariaDB`.
#[derive(Debug, Clone)]
pub struct MySqlBackend {
    /// Used for `DROP`/`CREATE DATABASE`.
    server: MySqlConnectOptions,
    /// Same server, scratch database selected.
    target: MySqlConnectOptions,
    database: String,
}

impl MySqlBackend {
    /// Parse the connection options. Nothing is sent to the server yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the URL cannot be
    /// parsed.
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let server = MySqlConnectOptions::from_str(&config.url).map_err(Error::Options)?;
        let target = server.clone().database(&config.database);

        Ok(Self {
            server,
            target,
            database: config.database.clone(),
        })
    }

    async fn connect(options: &MySqlConnectOptions) -> Result<MySqlConnection, Error> {
        MySqlConnection::connect_with(options)
            .await
            .map_err(Error::Connection)
    }
}

/// Run `sql` over the text protocol, as `sqlx`'s own transaction manager
/// does for transaction control.
async fn run(conn: &mut MySqlConnection, sql: &str) -> Result<u64, Error> {
    conn.execute(sql)
        .await
        .map(|done| done.rows_affected())
        .map_err(|source| Error::statement(sql, source))
}

impl Backend for MySqlBackend {
    type Error = Error;
    type Connection = MySqlConnection;
    type Session = MySqlSession;

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn permits_dirty_reads(&self) -> bool {
        true
    }

    async fn bootstrap(&self) -> Result<(), Error> {
        let database = quote_ident(&self.database, '`');

        let mut conn = Self::connect(&self.server).await?;
        run(&mut conn, &format!("DROP DATABASE IF EXISTS {database}")).await?;
        run(&mut conn, &format!("CREATE DATABASE {database}")).await?;
        conn.close().await.map_err(Error::Connection)?;

        let mut conn = Self::connect(&self.target).await?;
        run(&mut conn, CREATE_TABLE).await?;
        conn.close().await.map_err(Error::Connection)?;

        tracing::debug!(database = %self.database, "recreated database");
        Ok(())
    }

    async fn reset(&self) -> Result<MySqlConnection, Error> {
        let mut conn = Self::connect(&self.target).await?;
        run(&mut conn, "START TRANSACTION").await?;
        let deleted = run(&mut conn, DELETE_ALL).await?;
        run(&mut conn, "COMMIT").await?;

        tracing::debug!(deleted, "emptied table");
        Ok(conn)
    }

    async fn begin(
        &self,
        mut conn: MySqlConnection,
        level: Option<IsolationLevel>,
    ) -> Result<MySqlSession, Error> {
        // Without SESSION/GLOBAL this applies to the next transaction only,
        // so it has to come right before START TRANSACTION.
        if let Some(level) = level {
            let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql());
            run(&mut conn, &sql).await?;
        }
        run(&mut conn, "START TRANSACTION").await?;

        Ok(MySqlSession { conn })
    }
}

/// An open `MySQL` transaction on its own connection.
#[derive(Debug)]
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl TxSession for MySqlSession {
    type Error = Error;

    async fn execute(&mut self, stmt: Statement) -> Result<u64, Error> {
        let sql = stmt.sql(PARAMS);
        let mut query = sqlx::query::<MySql>(sql);
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
        let mut query = sqlx::query_scalar::<MySql, i32>(sql);
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
