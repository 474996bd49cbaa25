//! The three scripted demonstrations.
//!
//! Every scenario opens a writer session `A` and an observer session `B`
//! and issues the same interleaving:
//!
//! 1. `B` scans the table, so the engine fixes `B`'s isolation level and,
//!    for snapshot levels, its snapshot;
//! 2. `A` inserts the scenario's marker value;
//! 3. `B` probes for a row (phase *uncommitted*);
//! 4. `A` commits;
//! 5. `B` probes again (phase *committed*).
//!
//! Only the isolation levels, the marker and the probe differ, so the two
//! findings per scenario line up across all three levels.

use core::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::isolation::IsolationLevel;
use crate::observation::Observation;
use crate::report::{Finding, ScenarioReport};
use crate::session::{Backend, Session, SessionLabel, TxSession};
use crate::statement::Statement;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    /// `B` at read uncommitted sees `A`'s insert before `A` commits.
    ReadUncommitted,
    /// `B` at read committed sees nothing until `A` commits, then sees the
    /// row within the same transaction.
    ReadCommitted,
    /// `B` at repeatable read never sees `A`'s row, because its snapshot
    /// predates `A`'s commit.
    RepeatableRead,
}

/// When, relative to `A`'s commit, `B` probed the table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uncommitted,
    Committed,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Uncommitted => write!(f, "uncommitted"),
            Self::Committed => write!(f, "committed"),
        }
    }
}

impl Scenario {
    /// All scenarios in the order they run.
    pub const ALL: [Self; 3] = [Self::ReadUncommitted, Self::ReadCommitted, Self::RepeatableRead];

    /// Label printed at the start of every report line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "readUncommitted",
            Self::ReadCommitted => "readCommitted",
            Self::RepeatableRead => "repeatableRead",
        }
    }

    /// The value `A` inserts. Distinct per scenario so a row that leaked
    /// from an earlier scenario would be recognisable.
    #[must_use]
    pub const fn marker(self) -> i32 {
        match self {
            Self::ReadUncommitted => 1,
            Self::ReadCommitted => 2,
            Self::RepeatableRead => 3,
        }
    }

    /// Isolation levels of `A` and `B`. `None` is the engine default.
    #[must_use]
    pub const fn levels(self) -> (Option<IsolationLevel>, Option<IsolationLevel>) {
        match self {
            Self::ReadUncommitted => (None, Some(IsolationLevel::ReadUncommitted)),
            Self::ReadCommitted => (None, Some(IsolationLevel::ReadCommitted)),
            Self::RepeatableRead => (
                Some(IsolationLevel::RepeatableRead),
                Some(IsolationLevel::RepeatableRead),
            ),
        }
    }

    /// The query `B` uses to look for `A`'s row.
    #[must_use]
    pub const fn probe(self) -> Statement {
        match self {
            Self::ReadUncommitted | Self::ReadCommitted => Statement::SelectFirst,
            Self::RepeatableRead => Statement::SelectEq(self.marker()),
        }
    }

    /// What `B` should observe in each phase on an engine that does, or does
    /// not, honour read uncommitted literally.
    #[must_use]
    pub const fn expected(self, permits_dirty_reads: bool) -> [(Phase, Observation); 2] {
        let marker = Observation::Found(self.marker());
        let before = match self {
            Self::ReadUncommitted if permits_dirty_reads => marker,
            Self::ReadUncommitted | Self::ReadCommitted | Self::RepeatableRead => {
                Observation::NotFound
            }
        };
        let after = match self {
            Self::ReadUncommitted | Self::ReadCommitted => marker,
            Self::RepeatableRead => Observation::NotFound,
        };
        [(Phase::Uncommitted, before), (Phase::Committed, after)]
    }

    /// Run the scenario against `backend`.
    ///
    /// Both sessions are finished (rolled back if still active, then
    /// released) whether or not the script succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first driver error, or [`Error::Terminated`] if the
    /// script misuses a session. A script error takes precedence over
    /// errors from finishing the sessions, which are then only logged.
    pub async fn run<B>(self, backend: &B) -> Result<ScenarioReport, Error<B::Error>>
    where
        B: Backend,
    {
        let (level_a, level_b) = self.levels();
        tracing::info!(scenario = self.name(), engine = backend.name(), "running");

        let mut a = Session::open(backend, SessionLabel::A, level_a).await?;
        let mut b = match Session::open(backend, SessionLabel::B, level_b).await {
            Ok(b) => b,
            Err(err) => {
                if let Err(cleanup) = a.finish().await {
                    tracing::warn!(?cleanup, "failed to finish session A");
                }
                return Err(err);
            }
        };

        let scripted = self.script(&mut a, &mut b).await;
        let b_finished = b.finish().await;
        let a_finished = a.finish().await;

        let observed = match scripted {
            Ok(observed) => {
                b_finished?;
                a_finished?;
                observed
            }
            Err(err) => {
                for cleanup in [b_finished, a_finished].into_iter().filter_map(Result::err) {
                    tracing::warn!(?cleanup, "failed to finish session");
                }
                return Err(err);
            }
        };

        let expected = self.expected(backend.permits_dirty_reads());
        let findings = expected
            .into_iter()
            .zip(observed)
            .map(|((phase, expected), observed)| Finding {
                phase,
                observed,
                expected,
            })
            .collect();

        let report = ScenarioReport {
            scenario: self,
            engine: backend.name(),
            findings,
        };
        if !report.matches_expected() {
            tracing::warn!(
                scenario = self.name(),
                engine = backend.name(),
                "observations differ from the documented behaviour"
            );
        }
        Ok(report)
    }

    async fn script<S>(
        self,
        a: &mut Session<S>,
        b: &mut Session<S>,
    ) -> Result<[Observation; 2], Error<S::Error>>
    where
        S: TxSession,
    {
        let probe = self.probe();

        b.execute(Statement::Scan).await?;
        a.execute(Statement::Insert(self.marker())).await?;
        let before = b.fetch(probe).await?;
        a.commit().await?;
        let after = b.fetch(probe).await?;

        Ok([before, after])
    }
}

impl Display for Scenario {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name())
    }
}
