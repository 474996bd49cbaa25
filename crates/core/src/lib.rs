//! Deterministic demonstrations of SQL transaction isolation anomalies.
//!
//! `isodemo_core` drives two transactions against an external database and
//! reports what the observing transaction saw. No isolation is implemented
//! here: the database does all of it, and this crate only fixes the order in
//! which the two transactions' statements reach it.
//!
//! Three scenarios are provided, one per isolation level of the observer:
//!
//! 1. **Read Uncommitted** -- the observer sees the writer's row before the
//!    writer commits (dirty read).
//! 2. **Read Committed** -- the row is invisible until the writer commits and
//!    visible right after, inside the same observer transaction
//!    (non-repeatable read).
//! 3. **Repeatable Read** -- the row stays invisible even after the commit,
//!    because the observer's snapshot was taken at its first read.
//!
//! # Entry point
//!
//! Drivers implement [`Backend`] and [`TxSession`]. [`run_all()`] bootstraps
//! the scratch database and runs the selected scenarios in order:
//!
//! ```rust,ignore
//! use isodemo_core::{run_all, Scenario};
//!
//! let reports = run_all(&backend, &Scenario::ALL, |report| print!("{report}")).await?;
//! assert!(reports.iter().all(|r| r.matches_expected()));
//! ```
//!
//! Any driver error is fatal to the run. A query that matches nothing is a
//! normal [`Observation::NotFound`].

pub mod config;
pub mod error;
pub mod isolation;
pub mod observation;
pub mod report;
pub mod scenario;
pub mod session;
pub mod statement;

pub use config::{Config, ConfigError, Engine};
pub use error::Error;
pub use isolation::IsolationLevel;
pub use observation::Observation;
pub use report::{Finding, ScenarioReport};
pub use scenario::{Phase, Scenario};
pub use session::{Backend, Session, SessionLabel, SessionState, TxSession};
pub use statement::{ParamStyle, Statement, CREATE_TABLE, DELETE_ALL, TABLE};

/// Bootstrap the scratch database, then run `scenarios` one after another.
///
/// Scenarios run in [`Scenario::ALL`] order regardless of the order given,
/// and each at most once. `on_report` is called as soon as a scenario
/// finishes, so output is not held back until the whole run completes.
///
/// # Errors
///
/// Stops at the first error; reports of scenarios that already finished
/// have been passed to `on_report`.
pub async fn run_all<B, F>(
    backend: &B,
    scenarios: &[Scenario],
    mut on_report: F,
) -> Result<Vec<ScenarioReport>, Error<B::Error>>
where
    B: Backend,
    F: FnMut(&ScenarioReport),
{
    backend.bootstrap().await?;
    tracing::info!(engine = backend.name(), "bootstrapped scratch database");

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in Scenario::ALL {
        if !scenarios.contains(&scenario) {
            tracing::debug!(scenario = scenario.name(), "skipped");
            continue;
        }
        let report = scenario.run(backend).await?;
        on_report(&report);
        reports.push(report);
    }

    Ok(reports)
}
