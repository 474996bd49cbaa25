use derive_more::From;

use crate::session::{SessionLabel, SessionState};

/// Error raised while running a demonstration.
///
/// Every variant is fatal to the run. A query that matches no row is not an
/// error; it is reported as [`Observation::NotFound`](crate::Observation).
#[derive(Debug, From)]
pub enum Error<E> {
    /// The database driver failed (connection, statement, commit).
    #[from]
    Backend(E),
    /// A statement was issued on a session that already committed or rolled
    /// back.
    Terminated {
        session: SessionLabel,
        state: SessionState,
    },
}

impl<E> Error<E> {
    #[must_use]
    pub const fn backend(&self) -> Option<&E> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Terminated { .. } => None,
        }
    }
}
