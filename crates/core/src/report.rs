use core::fmt::{Display, Formatter, Result};

use serde::Serialize;

use crate::observation::Observation;
use crate::scenario::{Phase, Scenario};

/// What session `B` saw in one phase of a scenario.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub phase: Phase,
    pub observed: Observation,
    /// What the engine documents for this phase.
    pub expected: Observation,
}

impl Finding {
    #[must_use]
    pub fn matches(&self) -> bool {
        self.observed == self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub engine: &'static str,
    pub findings: Vec<Finding>,
}

impl ScenarioReport {
    #[must_use]
    pub fn matches_expected(&self) -> bool {
        self.findings.iter().all(Finding::matches)
    }

    /// One console line per finding, e.g. `readCommitted: uncommitted: not found`.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.findings.iter().map(|finding| {
            format!(
                "{}: {}: {}",
                self.scenario.name(),
                finding.phase,
                finding.observed
            )
        })
    }
}

impl Display for ScenarioReport {
    fn fmt(&self, f: &mut Formatter) -> Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ScenarioReport {
        ScenarioReport {
            scenario: Scenario::ReadCommitted,
            engine: "mysql",
            findings: vec![
                Finding {
                    phase: Phase::Uncommitted,
                    observed: Observation::NotFound,
                    expected: Observation::NotFound,
                },
                Finding {
                    phase: Phase::Committed,
                    observed: Observation::Found(2),
                    expected: Observation::Found(2),
                },
            ],
        }
    }

    #[test]
    fn renders_one_line_per_finding() {
        assert_eq!(
            report().to_string(),
            "readCommitted: uncommitted: not found\nreadCommitted: committed: 2\n"
        );
    }

    #[test]
    fn mismatch_is_detected() {
        let mut report = report();
        assert!(report.matches_expected());
        report.findings[0].observed = Observation::Found(2);
        assert!(!report.matches_expected());
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["scenario"], "readCommitted");
        assert_eq!(json["engine"], "mysql");
        assert_eq!(json["findings"][0]["phase"], "uncommitted");
        assert_eq!(json["findings"][1]["observed"]["found"], 2);
    }
}
