//! Runs the enabled requirements against one message log.

use mdib_ir::MessageLog;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalogue;
use crate::config::EngineConfig;
use crate::replay::partition_sessions;
use crate::requirements::{EvaluationContext, EvaluationError, Family, Requirement};
use crate::verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementReport {
    pub id: &'static str,
    pub family: Family,
    pub description: &'static str,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineReport {
    /// Number of sessions found in the log.
    pub sessions: usize,
    /// One entry per evaluated requirement, in catalogue order.
    pub requirements: Vec<RequirementReport>,
}

impl EngineReport {
    pub fn passed(&self) -> usize {
        self.count(Verdict::is_pass)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::is_fail)
    }

    pub fn no_test_data(&self) -> usize {
        self.count(Verdict::is_no_test_data)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn get(&self, id: &str) -> Option<&RequirementReport> {
        self.requirements.iter().find(|report| report.id == id)
    }

    fn count(&self, predicate: fn(&Verdict) -> bool) -> usize {
        self.requirements
            .iter()
            .filter(|report| predicate(&report.verdict))
            .count()
    }
}

pub struct Engine {
    config: EngineConfig,
    requirements: Vec<Box<dyn Requirement>>,
}

impl Engine {
    /// An engine running every catalogue requirement `config` enables.
    pub fn new(config: EngineConfig) -> Self {
        let requirements = catalogue::catalogue()
            .into_iter()
            .filter(|requirement| config.is_enabled(requirement.id()))
            .collect();
        Self::with_requirements(config, requirements)
    }

    pub fn with_requirements(config: EngineConfig, requirements: Vec<Box<dyn Requirement>>) -> Self {
        Self {
            config,
            requirements,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn requirement_ids(&self) -> Vec<&'static str> {
        self.requirements.iter().map(|requirement| requirement.id()).collect()
    }

    /// Evaluates every requirement. Requirements run in parallel; the report
    /// keeps their order. The first evaluation error aborts the run.
    pub fn run(&self, log: &dyn MessageLog) -> Result<EngineReport, EvaluationError> {
        let sessions = partition_sessions(log);
        debug!(sessions = sessions.len(), "partitioned message log");
        let ctx = EvaluationContext {
            log,
            sessions: &sessions,
            config: &self.config,
        };

        let requirements = self
            .requirements
            .par_iter()
            .map(|requirement| {
                let verdict = requirement.evaluate(&ctx)?;
                info!(
                    requirement = requirement.id(),
                    verdict = verdict.as_str(),
                    "requirement evaluated"
                );
                Ok(RequirementReport {
                    id: requirement.id(),
                    family: requirement.family(),
                    description: requirement.description(),
                    verdict,
                })
            })
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        Ok(EngineReport {
            sessions: sessions.len(),
            requirements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdib_ir::fixtures::*;
    use mdib_ir::{
        AlertActivation, DescriptionModificationType, InMemoryLog, MetricCategory, ReportFamily,
    };

    use crate::replay::ReplayError;

    #[test]
    fn disabled_requirements_are_skipped() {
        let mut config = EngineConfig::default();
        config
            .enabled
            .insert(catalogue::BICEPS_R0033.to_string(), false);
        let engine = Engine::new(config);
        let ids = engine.requirement_ids();
        assert_eq!(ids.len(), catalogue::requirement_ids().len() - 1);
        assert!(!ids.contains(&catalogue::BICEPS_R0033));
    }

    #[test]
    fn report_preserves_catalogue_order() {
        let log = InMemoryLog::new(vec![standard_baseline(10, SEQUENCE_ID, 0)], vec![]);
        let report = Engine::new(EngineConfig::default()).run(&log).unwrap();
        let ids: Vec<_> = report.requirements.iter().map(|r| r.id).collect();
        assert_eq!(ids, catalogue::requirement_ids());
        assert_eq!(report.sessions, 1);
        assert!(!report.has_failures());
    }

    #[test]
    fn failing_requirement_is_counted() {
        let report_message = state_report(
            20,
            SEQUENCE_ID,
            1,
            ReportFamily::Alert,
            vec![
                alert_system_state(ALERT_SYSTEM, AlertActivation::Off)
                    .with_state_version(1)
                    .with_descriptor_version(0),
            ],
        );
        let log = InMemoryLog::new(
            vec![standard_baseline(10, SEQUENCE_ID, 0), report_message],
            vec![],
        );
        let engine = Engine::with_requirements(
            EngineConfig::default(),
            vec![catalogue::find(catalogue::BICEPS_R0116).unwrap()],
        );
        let report = engine.run(&log).unwrap();
        assert_eq!(report.failed(), 1);
        assert!(report.get(catalogue::BICEPS_R0116).unwrap().verdict.is_fail());
    }

    #[test]
    fn misordered_parts_fail_part_ordering_in_a_full_run() {
        let child_first = description_modification(
            20,
            SEQUENCE_ID,
            1,
            vec![
                part(
                    DescriptionModificationType::Create,
                    Some("ch1"),
                    vec![numeric_metric("m.child", MetricCategory::Measurement).with_version(0)],
                    vec![],
                ),
                part(
                    DescriptionModificationType::Create,
                    Some(VMD),
                    vec![channel("ch1").with_version(0)],
                    vec![],
                ),
            ],
        );
        let log = InMemoryLog::new(
            vec![standard_baseline(10, SEQUENCE_ID, 0), child_first],
            vec![],
        );
        let report = Engine::new(EngineConfig::default()).run(&log).unwrap();
        assert_eq!(report.requirements.len(), catalogue::requirement_ids().len());
        match &report.get(catalogue::BICEPS_R5025_0).unwrap().verdict {
            Verdict::Fail(failure) => {
                assert_eq!(failure.handles, vec!["m.child".to_string(), "ch1".to_string()]);
                assert_eq!(failure.mdib_version, Some(1));
            }
            other => panic!("expected FAIL, got: {other}"),
        }
    }

    #[test]
    fn malformed_session_is_an_error() {
        let log = InMemoryLog::new(
            vec![state_report(
                20,
                SEQUENCE_ID,
                1,
                ReportFamily::Metric,
                vec![],
            )],
            vec![],
        );
        let engine = Engine::with_requirements(
            EngineConfig::default(),
            vec![catalogue::find(catalogue::BICEPS_R0033).unwrap()],
        );
        match engine.run(&log).unwrap_err() {
            EvaluationError::Replay {
                source: ReplayError::MissingBaseline { .. },
                ..
            } => {}
            other => panic!("expected MissingBaseline, got: {other}"),
        }
    }
}
