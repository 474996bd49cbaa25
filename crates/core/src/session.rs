//! Transactional sessions and the seam drivers implement.

use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::isolation::IsolationLevel;
use crate::observation::Observation;
use crate::statement::Statement;

/// A database engine the demonstrations can run against.
///
/// Methods are awaited strictly one after another; nothing here is driven
/// from more than one task.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// The error type returned by this driver.
    type Error: Debug;
    /// A live connection to the scratch database with no open transaction.
    type Connection;
    /// A connection with an open transaction.
    type Session: TxSession<Error = Self::Error>;

    /// Engine label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether `READ UNCOMMITTED` actually exposes uncommitted rows.
    fn permits_dirty_reads(&self) -> bool;

    /// Drop and recreate the scratch database and its table.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or any DDL fails.
    async fn bootstrap(&self) -> Result<(), Self::Error>;

    /// Empty the table in a committed transaction of its own and hand back
    /// the connection it ran on.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or deleting fails.
    async fn reset(&self) -> Result<Self::Connection, Self::Error>;

    /// Begin a transaction on `conn`, with `level` or the engine default.
    ///
    /// # Errors
    ///
    /// Returns an error if the isolation level or the transaction cannot be
    /// started.
    async fn begin(
        &self,
        conn: Self::Connection,
        level: Option<IsolationLevel>,
    ) -> Result<Self::Session, Self::Error>;
}

/// A driver's open transaction.
#[allow(async_fn_in_trait)]
pub trait TxSession {
    type Error: Debug;

    /// Run a write or the no-op scan and return the affected row count.
    async fn execute(&mut self, stmt: Statement) -> Result<u64, Self::Error>;

    /// Run a single-row query.
    async fn fetch(&mut self, stmt: Statement) -> Result<Option<i32>, Self::Error>;

    async fn commit(&mut self) -> Result<(), Self::Error>;

    async fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Release the underlying connection.
    async fn close(self) -> Result<(), Self::Error>;
}

/// Which of a scenario's two sessions this is. `A` writes, `B` observes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionLabel {
    A,
    B,
}

impl Display for SessionLabel {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Committed,
    RolledBack,
}

/// A driver session plus its lifecycle: `Active`, then exactly one of
/// `Committed` or `RolledBack`.
///
/// Once terminal, every statement is refused with [`Error::Terminated`].
/// [`Session::finish`] must be called on every exit path; it rolls back an
/// active transaction and releases the connection.
pub struct Session<S> {
    label: SessionLabel,
    level: Option<IsolationLevel>,
    state: SessionState,
    inner: S,
}

impl<S> Session<S>
where
    S: TxSession,
{
    /// Reset the table, then begin a transaction on the fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the reset or `BEGIN` fails.
    pub async fn open<B>(
        backend: &B,
        label: SessionLabel,
        level: Option<IsolationLevel>,
    ) -> Result<Self, Error<S::Error>>
    where
        B: Backend<Session = S, Error = S::Error>,
    {
        let conn = backend.reset().await?;
        let inner = backend.begin(conn, level).await?;
        tracing::debug!(session = %label, ?level, "began transaction");
        Ok(Self::new(label, level, inner))
    }

    /// Wrap a transaction the driver has already begun.
    pub const fn new(label: SessionLabel, level: Option<IsolationLevel>, inner: S) -> Self {
        Self {
            label,
            level,
            state: SessionState::Active,
            inner,
        }
    }

    pub const fn label(&self) -> SessionLabel {
        self.label
    }

    pub const fn level(&self) -> Option<IsolationLevel> {
        self.level
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    fn ensure_active(&self) -> Result<(), Error<S::Error>> {
        match self.state {
            SessionState::Active => Ok(()),
            state => Err(Error::Terminated {
                session: self.label,
                state,
            }),
        }
    }

    /// # Errors
    ///
    /// Fails if the session is terminal or the driver fails.
    pub async fn execute(&mut self, stmt: Statement) -> Result<u64, Error<S::Error>> {
        self.ensure_active()?;
        let rows = self.inner.execute(stmt).await?;
        tracing::debug!(session = %self.label, ?stmt, rows, "executed");
        Ok(rows)
    }

    /// # Errors
    ///
    /// Fails if the session is terminal or the driver fails. No matching row
    /// is `Ok(Observation::NotFound)`.
    pub async fn fetch(&mut self, stmt: Statement) -> Result<Observation, Error<S::Error>> {
        self.ensure_active()?;
        let observed = Observation::from(self.inner.fetch(stmt).await?);
        tracing::debug!(session = %self.label, ?stmt, %observed, "fetched");
        Ok(observed)
    }

    /// # Errors
    ///
    /// Fails if the session is terminal or `COMMIT` fails. A failed commit
    /// leaves the session active so [`Session::finish`] still rolls it back.
    pub async fn commit(&mut self) -> Result<(), Error<S::Error>> {
        self.ensure_active()?;
        self.inner.commit().await?;
        self.state = SessionState::Committed;
        tracing::debug!(session = %self.label, "committed");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the session is terminal or `ROLLBACK` fails.
    pub async fn rollback(&mut self) -> Result<(), Error<S::Error>> {
        self.ensure_active()?;
        self.state = SessionState::RolledBack;
        self.inner.rollback().await?;
        tracing::debug!(session = %self.label, "rolled back");
        Ok(())
    }

    /// Roll back if still active, then release the connection. The
    /// connection is released even if the rollback fails.
    ///
    /// # Errors
    ///
    /// Returns the rollback error if there was one, otherwise the close
    /// error.
    pub async fn finish(mut self) -> Result<(), Error<S::Error>> {
        let rolled_back = match self.state {
            SessionState::Active => self.rollback().await,
            SessionState::Committed | SessionState::RolledBack => Ok(()),
        };
        let closed = self.inner.close().await.map_err(Error::Backend);
        rolled_back.and(closed)
    }
}

impl<S> Debug for Session<S> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("Session")
            .field("label", &self.label)
            .field("level", &self.level)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
