//! Verdicts and how they combine across sessions.

use std::fmt;

use mdib_ir::{Handle, Version};
use serde::{Deserialize, Serialize};

use crate::replay::Step;

/// A concrete violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handles: Vec<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdib_version: Option<Version>,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            handles: Vec::new(),
            sequence_id: None,
            mdib_version: None,
        }
    }

    pub fn with_handles<I, H>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<Handle>,
    {
        self.handles.extend(handles.into_iter().map(Into::into));
        self
    }

    /// Pins the failure to the session and mdib version of `step`.
    pub fn at(mut self, step: &Step<'_>) -> Self {
        self.sequence_id = Some(step.sequence_id().to_string());
        self.mdib_version = Some(step.mdib_version());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict")]
pub enum Verdict {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail(Failure),
    #[serde(rename = "NO-TEST-DATA")]
    NoTestData { reason: String },
}

impl Verdict {
    pub fn no_test_data(reason: impl Into<String>) -> Self {
        Verdict::NoTestData {
            reason: reason.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail(_) => "FAIL",
            Verdict::NoTestData { .. } => "NO-TEST-DATA",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }

    pub fn is_no_test_data(&self) -> bool {
        matches!(self, Verdict::NoTestData { .. })
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Verdict::Fail(failure) => Some(failure),
            _ => None,
        }
    }

    /// The failure or no-test-data reason.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(failure) => Some(&failure.reason),
            Verdict::NoTestData { reason } => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.as_str(), reason),
            None => f.write_str(self.as_str()),
        }
    }
}

/// What one unit of evidence (a session, a manipulation) showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The situation occurred and the requirement held.
    Satisfied,
    /// The situation never occurred.
    PreconditionAbsent,
    Violated(Failure),
}

impl SessionOutcome {
    pub fn from_evidence(seen: bool) -> Self {
        if seen {
            SessionOutcome::Satisfied
        } else {
            SessionOutcome::PreconditionAbsent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum AggregateState {
    #[default]
    Unseen,
    NoEvidence,
    Evidence,
    Failed(Failure),
}

/// Folds per-session outcomes into one verdict.
///
/// FAIL wins over PASS, which wins over NO-TEST-DATA. The first failure is
/// the one reported.
#[derive(Debug, Clone, Default)]
pub struct VerdictAggregator {
    state: AggregateState,
}

impl VerdictAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: SessionOutcome) {
        let next = match (std::mem::take(&mut self.state), outcome) {
            (failed @ AggregateState::Failed(_), _) => failed,
            (_, SessionOutcome::Violated(failure)) => AggregateState::Failed(failure),
            (AggregateState::Evidence, _) | (_, SessionOutcome::Satisfied) => {
                AggregateState::Evidence
            }
            (_, SessionOutcome::PreconditionAbsent) => AggregateState::NoEvidence,
        };
        self.state = next;
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, AggregateState::Failed(_))
    }

    /// The combined verdict. No outcomes at all, or only absent
    /// preconditions, give NO-TEST-DATA with `no_test_data_reason`.
    pub fn finish(self, no_test_data_reason: &str) -> Verdict {
        match self.state {
            AggregateState::Failed(failure) => Verdict::Fail(failure),
            AggregateState::Evidence => Verdict::Pass,
            AggregateState::Unseen | AggregateState::NoEvidence => {
                Verdict::no_test_data(no_test_data_reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_outcomes_is_no_test_data() {
        let verdict = VerdictAggregator::new().finish("nothing seen");
        assert_eq!(verdict, Verdict::no_test_data("nothing seen"));
    }

    #[test]
    fn evidence_beats_absent_preconditions() {
        let mut aggregator = VerdictAggregator::new();
        aggregator.record(SessionOutcome::PreconditionAbsent);
        aggregator.record(SessionOutcome::Satisfied);
        aggregator.record(SessionOutcome::PreconditionAbsent);
        assert_eq!(aggregator.finish("unused"), Verdict::Pass);
    }

    #[test]
    fn first_failure_wins() {
        let mut aggregator = VerdictAggregator::new();
        aggregator.record(SessionOutcome::Satisfied);
        aggregator.record(SessionOutcome::Violated(Failure::new("first")));
        aggregator.record(SessionOutcome::Satisfied);
        aggregator.record(SessionOutcome::Violated(Failure::new("second")));
        assert!(aggregator.has_failed());
        match aggregator.finish("unused") {
            Verdict::Fail(failure) => assert_eq!(failure.reason, "first"),
            other => panic!("expected Fail, got: {other}"),
        }
    }

    #[test]
    fn serializes_with_verdict_tag() {
        let json = serde_json::to_value(Verdict::Fail(
            Failure::new("broken").with_handles(["m0"]),
        ))
        .unwrap();
        assert_eq!(json["verdict"], "FAIL");
        assert_eq!(json["reason"], "broken");
        assert_eq!(json["handles"][0], "m0");

        let json = serde_json::to_value(Verdict::no_test_data("none")).unwrap();
        assert_eq!(json["verdict"], "NO-TEST-DATA");
    }
}
