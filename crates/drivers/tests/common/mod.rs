#![allow(dead_code)]

//! Shared checks for the live-server tests.
//!
//! Each test file reads its server URL from an environment variable and
//! skips when it is unset, so `cargo test` passes without any database.

use isodemo_core::Observation::NotFound;
use isodemo_core::{run_all, Backend, Config, Scenario, Session, SessionLabel, Statement};

/// Scratch database used by the live tests; dropped on every bootstrap.
pub const TEST_DATABASE: &str = "isodemo_test";

pub fn config(var: &str) -> Option<Config> {
    match std::env::var(var) {
        Ok(url) => Some(Config::new(url, TEST_DATABASE)),
        Err(_) => {
            eprintln!("{var} not set; skipping");
            None
        }
    }
}

/// Every scenario behaves as the engine documents and prints two lines.
pub async fn scenarios_match_engine<B: Backend>(backend: &B) {
    let mut lines = Vec::new();
    let reports = run_all(backend, &Scenario::ALL, |report| lines.extend(report.lines()))
        .await
        .unwrap();

    assert_eq!(lines.len(), 6);
    for report in &reports {
        assert!(report.matches_expected(), "{report:?}");
    }
}

/// Bootstrapping twice leaves the table in place and empty.
pub async fn bootstrap_twice_leaves_empty_table<B: Backend>(backend: &B) {
    backend.bootstrap().await.unwrap();
    backend.bootstrap().await.unwrap();

    let mut session = Session::open(backend, SessionLabel::B, None).await.unwrap();
    assert_eq!(session.execute(Statement::Scan).await.unwrap(), 0);
    assert_eq!(session.fetch(Statement::SelectFirst).await.unwrap(), NotFound);
    session.finish().await.unwrap();
}

/// A committed row from one scenario is gone when the next session opens.
pub async fn reset_empties_table<B: Backend>(backend: &B) {
    backend.bootstrap().await.unwrap();

    let mut writer = Session::open(backend, SessionLabel::A, None).await.unwrap();
    writer.execute(Statement::Insert(42)).await.unwrap();
    writer.commit().await.unwrap();
    writer.finish().await.unwrap();

    let mut reader = Session::open(backend, SessionLabel::B, None).await.unwrap();
    assert_eq!(reader.fetch(Statement::SelectEq(42)).await.unwrap(), NotFound);
    reader.finish().await.unwrap();
}
