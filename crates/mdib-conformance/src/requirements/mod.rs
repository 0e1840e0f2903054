//! The requirement framework and the requirement families.
//!
//! Most requirements are per-session visitors: they watch every replayed
//! [`Step`] of a session, may stop it early with a [`Failure`], and finally
//! report whether the situation they test ever occurred.
//! [`evaluate_sessions`] runs one visitor per session and folds the outcomes.

pub mod activation;
pub mod change;
pub mod context;
pub mod handles;
pub mod manipulation;
pub mod versioning;

use std::fmt;
use std::ops::ControlFlow;

use mdib_ir::MessageLog;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::EngineConfig;
use crate::replay::{ReplayError, SessionHistory, Step};
use crate::verdict::{Failure, SessionOutcome, Verdict, VerdictAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    VersionMonotonicity,
    ChangeAuthenticity,
    HierarchicalActivation,
    ManipulationCorrelation,
    HandleIntegrity,
    ContextAssociation,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::VersionMonotonicity => "version-monotonicity",
            Family::ChangeAuthenticity => "change-authenticity",
            Family::HierarchicalActivation => "hierarchical-activation",
            Family::ManipulationCorrelation => "manipulation-correlation",
            Family::HandleIntegrity => "handle-integrity",
            Family::ContextAssociation => "context-association",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a requirement may look at. All of it is read-only.
pub struct EvaluationContext<'a> {
    pub log: &'a dyn MessageLog,
    pub sessions: &'a [SessionHistory<'a>],
    pub config: &'a EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("{requirement}: {source}")]
    Replay {
        requirement: &'static str,
        #[source]
        source: ReplayError,
    },
}

pub trait Requirement: Send + Sync {
    /// Stable identifier, e.g. `BICEPS.R0033`.
    fn id(&self) -> &'static str;
    fn family(&self) -> Family;
    /// One-line summary for listings.
    fn description(&self) -> &'static str;
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError>;
}

/// Per-session state of a replay-based requirement.
pub trait SessionVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure>;

    /// Whether the session gave this requirement anything to judge.
    fn outcome(&self) -> SessionOutcome;

    /// Turns a replay error into a violation when the error is exactly what
    /// the requirement tests. Other errors are handed back.
    fn replay_failed(&mut self, error: ReplayError) -> Result<Failure, ReplayError> {
        Err(error)
    }
}

/// Replays every session with a fresh visitor and folds the outcomes.
///
/// A replay error aborts only the affected session. Errors that are a
/// violation some other requirement judges leave this requirement without
/// evidence from that session. Any other error is returned once the
/// remaining sessions have been evaluated.
pub fn evaluate_sessions<V, F>(
    requirement: &'static str,
    sessions: &[SessionHistory<'_>],
    mut visitor: F,
    no_test_data_reason: &str,
) -> Result<Verdict, EvaluationError>
where
    V: SessionVisitor,
    F: FnMut() -> V,
{
    let mut aggregator = VerdictAggregator::new();
    let mut first_error = None;
    for session in sessions {
        let mut state = visitor();
        let outcome = match session.replay(|step| state.visit(step)) {
            Ok(ControlFlow::Break(failure)) => SessionOutcome::Violated(failure),
            Ok(ControlFlow::Continue(())) => state.outcome(),
            Err(error) => match state.replay_failed(error) {
                Ok(failure) => SessionOutcome::Violated(failure),
                Err(error) if error.is_requirement_violation() => {
                    warn!(
                        requirement,
                        sequence_id = %session.sequence_id,
                        %error,
                        "session replay stopped early, evidence up to the failing message only"
                    );
                    state.outcome()
                }
                Err(error) => {
                    warn!(
                        requirement,
                        sequence_id = %session.sequence_id,
                        %error,
                        "session replay aborted"
                    );
                    first_error.get_or_insert(error);
                    continue;
                }
            },
        };
        aggregator.record(outcome);
    }
    match first_error {
        Some(source) => Err(EvaluationError::Replay {
            requirement,
            source,
        }),
        None => Ok(aggregator.finish(no_test_data_reason)),
    }
}

/// The first version issue that makes a versioning requirement fail.
pub(crate) fn implied_version_failure(step: &Step<'_>) -> Option<Failure> {
    step.issues
        .iter()
        .find(|issue| issue.is_implied_after_observed())
        .map(|issue| {
            Failure::new(issue.to_string())
                .with_handles([issue.handle.clone()])
                .at(step)
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use mdib_ir::{InMemoryLog, ManipulationRecord, Message};

    use super::*;
    use crate::replay::partition_sessions;

    /// Evaluates `requirement` against a log built from `messages`.
    pub fn evaluate(requirement: &dyn Requirement, messages: Vec<Message>) -> Verdict {
        evaluate_with(requirement, messages, vec![]).unwrap()
    }

    pub fn evaluate_with(
        requirement: &dyn Requirement,
        messages: Vec<Message>,
        manipulations: Vec<ManipulationRecord>,
    ) -> Result<Verdict, EvaluationError> {
        let log = InMemoryLog::new(messages, manipulations);
        let sessions = partition_sessions(&log);
        let config = EngineConfig::default();
        let ctx = EvaluationContext {
            log: &log,
            sessions: &sessions,
            config: &config,
        };
        requirement.evaluate(&ctx)
    }

    pub fn expect_fail(verdict: Verdict) -> Failure {
        match verdict {
            Verdict::Fail(failure) => failure,
            other => panic!("expected FAIL, got: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdib_ir::fixtures::*;
    use mdib_ir::{
        ComponentActivation, DescriptionModificationType, InMemoryLog, MetricCategory,
        ReportFamily,
    };

    use crate::replay::partition_sessions;

    /// Counts reports and fails when a metric is switched off.
    #[derive(Default)]
    struct OffDetector {
        reports: usize,
    }

    impl SessionVisitor for OffDetector {
        fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
            if step.message.report_family().is_some() {
                self.reports += 1;
            }
            let off = step
                .after
                .state(MEASUREMENT_METRIC)
                .and_then(|state| state.component_activation())
                == Some(ComponentActivation::Off);
            if off {
                return ControlFlow::Break(Failure::new("metric off").at(step));
            }
            ControlFlow::Continue(())
        }

        fn outcome(&self) -> SessionOutcome {
            SessionOutcome::from_evidence(self.reports > 0)
        }
    }

    fn metric_report(ts: u64, seq: &str, version: u64, activation: ComponentActivation) -> mdib_ir::Message {
        state_report(
            ts,
            seq,
            version,
            ReportFamily::Metric,
            vec![metric_state(MEASUREMENT_METRIC, activation).with_state_version(version)],
        )
    }

    #[test]
    fn failure_in_any_session_fails_the_requirement() {
        let log = InMemoryLog::new(
            vec![
                standard_baseline(10, SEQUENCE_ID, 1),
                metric_report(20, SEQUENCE_ID, 2, ComponentActivation::StandBy),
                standard_baseline(30, OTHER_SEQUENCE_ID, 1),
                metric_report(40, OTHER_SEQUENCE_ID, 2, ComponentActivation::Off),
            ],
            vec![],
        );
        let sessions = partition_sessions(&log);
        let verdict =
            evaluate_sessions("TEST", &sessions, OffDetector::default, "no reports").unwrap();
        let failure = verdict.failure().unwrap();
        assert_eq!(failure.sequence_id.as_deref(), Some(OTHER_SEQUENCE_ID));
        assert_eq!(failure.mdib_version, Some(2));
    }

    #[test]
    fn sessions_without_evidence_give_no_test_data() {
        let log = InMemoryLog::new(vec![standard_baseline(10, SEQUENCE_ID, 1)], vec![]);
        let sessions = partition_sessions(&log);
        let verdict =
            evaluate_sessions("TEST", &sessions, OffDetector::default, "no reports").unwrap();
        assert_eq!(verdict, Verdict::no_test_data("no reports"));
    }

    #[test]
    fn replay_errors_surface_after_all_sessions_ran() {
        let log = InMemoryLog::new(
            vec![
                metric_report(10, SEQUENCE_ID, 2, ComponentActivation::On),
                standard_baseline(20, OTHER_SEQUENCE_ID, 1),
                metric_report(30, OTHER_SEQUENCE_ID, 2, ComponentActivation::StandBy),
            ],
            vec![],
        );
        let sessions = partition_sessions(&log);
        let err =
            evaluate_sessions("TEST", &sessions, OffDetector::default, "no reports").unwrap_err();
        match err {
            EvaluationError::Replay {
                requirement,
                source: ReplayError::MissingBaseline { sequence_id },
            } => {
                assert_eq!(requirement, "TEST");
                assert_eq!(sequence_id, SEQUENCE_ID);
            }
            other => panic!("expected MissingBaseline, got: {other}"),
        }
    }

    #[test]
    fn misordered_parts_do_not_abort_unrelated_requirements() {
        let child_first = description_modification(
            30,
            SEQUENCE_ID,
            3,
            vec![
                part(
                    DescriptionModificationType::Create,
                    Some("ch1"),
                    vec![numeric_metric("m.child", MetricCategory::Measurement)],
                    vec![],
                ),
                part(
                    DescriptionModificationType::Create,
                    Some(VMD),
                    vec![channel("ch1")],
                    vec![],
                ),
            ],
        );
        let log = InMemoryLog::new(
            vec![
                standard_baseline(10, SEQUENCE_ID, 1),
                metric_report(20, SEQUENCE_ID, 2, ComponentActivation::StandBy),
                child_first,
                metric_report(40, SEQUENCE_ID, 4, ComponentActivation::Off),
            ],
            vec![],
        );
        let sessions = partition_sessions(&log);
        let verdict =
            evaluate_sessions("TEST", &sessions, OffDetector::default, "no reports").unwrap();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn misordered_parts_before_any_evidence_give_no_test_data() {
        let child_first = description_modification(
            20,
            SEQUENCE_ID,
            2,
            vec![
                part(
                    DescriptionModificationType::Create,
                    Some("ch1"),
                    vec![numeric_metric("m.child", MetricCategory::Measurement)],
                    vec![],
                ),
                part(
                    DescriptionModificationType::Create,
                    Some(VMD),
                    vec![channel("ch1")],
                    vec![],
                ),
            ],
        );
        let log = InMemoryLog::new(
            vec![standard_baseline(10, SEQUENCE_ID, 1), child_first],
            vec![],
        );
        let sessions = partition_sessions(&log);
        let verdict =
            evaluate_sessions("TEST", &sessions, OffDetector::default, "no reports").unwrap();
        assert_eq!(verdict, Verdict::no_test_data("no reports"));
    }
}
