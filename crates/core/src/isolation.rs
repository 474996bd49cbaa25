use core::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Transaction isolation levels a session can be opened with, ordered from
/// weakest to strongest.
///
/// Sessions opened without a level use whatever the database defaults to
/// (`REPEATABLE READ` on `MySQL`, `READ COMMITTED` on `PostgreSQL`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    /// Reads may observe uncommitted writes of other transactions.
    ReadUncommitted,
    /// Reads observe only committed data, re-evaluated per statement.
    ReadCommitted,
    /// Reads observe a snapshot fixed by the first read of the transaction.
    RepeatableRead,
    /// Equivalent to some serial execution.
    Serializable,
}

impl IsolationLevel {
    pub const ALL: [Self; 4] = [
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::RepeatableRead,
        Self::Serializable,
    ];

    /// The keyword phrase used by `SET TRANSACTION ISOLATION LEVEL` and
    /// `BEGIN ISOLATION LEVEL`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }

    /// Whether the level, taken literally, allows dirty reads.
    #[must_use]
    pub const fn permits_dirty_reads(self) -> bool {
        matches!(self, Self::ReadUncommitted)
    }

    /// Whether the level allows a repeated query to see rows committed
    /// after the transaction's first read.
    #[must_use]
    pub const fn permits_non_repeatable_reads(self) -> bool {
        matches!(self, Self::ReadUncommitted | Self::ReadCommitted)
    }
}

impl Display for IsolationLevel {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::ReadUncommitted => write!(f, "read uncommitted"),
            Self::ReadCommitted => write!(f, "read committed"),
            Self::RepeatableRead => write!(f, "repeatable read"),
            Self::Serializable => write!(f, "serializable"),
        }
    }
}
