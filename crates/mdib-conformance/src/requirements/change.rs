//! Change-Authenticity: every reported element really changed, and
//! description modification reports are flat and parent-first.

use std::ops::ControlFlow;

use mdib_ir::{
    DescriptionModificationType, Direction, MessageBody, ReportFamily, State, StateFamily,
    TimeRange,
};

use super::{
    evaluate_sessions, EvaluationContext, EvaluationError, Family, Requirement, SessionVisitor,
};
use crate::catalogue;
use crate::equality::{descriptor_content_eq, state_content_eq};
use crate::replay::{describe_part, has_parent_child_parts, ReplayError, Step};
use crate::verdict::{Failure, SessionOutcome, Verdict, VerdictAggregator};

pub const NO_DESCRIPTION_MODIFICATION: &str =
    "No DescriptionModificationReport seen during test run, test failed.";
pub const NO_NESTING_CANDIDATES: &str =
    "No Descriptors in DescriptionModificationReports seen during test run, test failed.";
pub const NO_PARENT_CHILD_PARTS: &str =
    "No DescriptionModificationReports with Parent-Child Relationships between Descriptors seen during test run, test failed.";

// ---------------------------------------------------------------------------
// BICEPS.C-5: description modifications are genuine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DescriptionModificationGenuine;

#[derive(Debug, Default)]
struct DescriptionModificationVisitor {
    reports_seen: bool,
}

impl SessionVisitor for DescriptionModificationVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        let MessageBody::DescriptionModificationReport { parts } = &step.message.body else {
            return ControlFlow::Continue(());
        };
        self.reports_seen = true;
        for part in parts {
            for descriptor in &part.descriptors {
                let handle = &descriptor.handle;
                let before = step.before.descriptor(handle);
                let after = step.after.descriptor(handle);
                let reason = match (part.modification(), before, after) {
                    (DescriptionModificationType::Update, Some(before), Some(after)) => {
                        if !descriptor_content_eq(before, after) {
                            continue;
                        }
                        format!("The descriptor with the handle {handle} from the report has not changed")
                    }
                    (DescriptionModificationType::Update, _, _) => {
                        format!("The descriptor with handle {handle} is not present")
                    }
                    (DescriptionModificationType::Create, None, Some(_)) => continue,
                    (DescriptionModificationType::Create, before, after) => format!(
                        "The descriptor with handle {handle} is missing before applying the report: {} and is present after applying the report: {}, for modification type create",
                        before.is_none(),
                        after.is_some()
                    ),
                    (DescriptionModificationType::Delete, Some(_), None) => continue,
                    (DescriptionModificationType::Delete, before, after) => format!(
                        "The descriptor with handle {handle} is present before applying the report: {} and is missing after applying the report: {}, for modification type delete",
                        before.is_some(),
                        after.is_none()
                    ),
                };
                return ControlFlow::Break(
                    Failure::new(reason).with_handles([handle.clone()]).at(step),
                );
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.reports_seen)
    }
}

impl Requirement for DescriptionModificationGenuine {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_C_5
    }

    fn family(&self) -> Family {
        Family::ChangeAuthenticity
    }

    fn description(&self) -> &'static str {
        "Descriptors in description modification reports were created, deleted or really updated"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            DescriptionModificationVisitor::default,
            NO_DESCRIPTION_MODIFICATION,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.C-11 .. BICEPS.C-15: reported states are genuine changes
// ---------------------------------------------------------------------------

/// Every part of an episodic report of one family changes at least one
/// state. Context reports may introduce new context states.
#[derive(Debug)]
pub struct StateReportGenuine {
    family: ReportFamily,
}

impl StateReportGenuine {
    pub fn new(family: ReportFamily) -> Self {
        Self { family }
    }

    fn no_test_data_reason(&self) -> &'static str {
        match self.family {
            ReportFamily::Alert => "No AlertReports seen during test run, test failed.",
            ReportFamily::Component => "No ComponentReports seen during test run, test failed.",
            ReportFamily::Context => "No ContextReports seen during test run, test failed.",
            ReportFamily::Metric => "No MetricReports seen during test run, test failed.",
            ReportFamily::Operational => {
                "No OperationalStateReports seen during test run, test failed."
            }
        }
    }
}

/// A part is genuine when all its states exist and at least one changed.
fn check_report_part(step: &Step<'_>, states: &[State]) -> Result<(), Failure> {
    let mut unchanged = Vec::new();
    for reported in states {
        let key = reported.key();
        match (step.before.state(key), step.after.state(key)) {
            (Some(before), Some(after)) if state_content_eq(before, after) => {
                unchanged.push(key.clone());
            }
            (Some(_), Some(_)) => {}
            (None, Some(_)) if reported.family() == StateFamily::Context => {}
            _ => {
                return Err(Failure::new(format!("The state with handle {key} is not present"))
                    .with_handles([key.clone()]));
            }
        }
    }
    if states.is_empty() || unchanged.len() < states.len() {
        return Ok(());
    }
    let reason = match unchanged.as_slice() {
        [key] => format!("The state with the handle {key} from the report has not changed"),
        keys => format!(
            "None of the states with the handles {} from the report part has changed",
            keys.join(", ")
        ),
    };
    Err(Failure::new(reason).with_handles(unchanged))
}

#[derive(Debug)]
struct StateReportVisitor {
    family: ReportFamily,
    reports_seen: bool,
}

impl SessionVisitor for StateReportVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        let MessageBody::StateReport { family, parts } = &step.message.body else {
            return ControlFlow::Continue(());
        };
        if *family != self.family {
            return ControlFlow::Continue(());
        }
        self.reports_seen = true;
        for part in parts {
            if let Err(failure) = check_report_part(step, &part.states) {
                return ControlFlow::Break(failure.at(step));
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.reports_seen)
    }
}

impl Requirement for StateReportGenuine {
    fn id(&self) -> &'static str {
        match self.family {
            ReportFamily::Alert => catalogue::BICEPS_C_11,
            ReportFamily::Component => catalogue::BICEPS_C_12,
            ReportFamily::Context => catalogue::BICEPS_C_13,
            ReportFamily::Metric => catalogue::BICEPS_C_14,
            ReportFamily::Operational => catalogue::BICEPS_C_15,
        }
    }

    fn family(&self) -> Family {
        Family::ChangeAuthenticity
    }

    fn description(&self) -> &'static str {
        match self.family {
            ReportFamily::Alert => "Every part of an EpisodicAlertReport changes at least one state",
            ReportFamily::Component => "Every part of an EpisodicComponentReport changes at least one state",
            ReportFamily::Context => "Every part of an EpisodicContextReport changes or adds a state",
            ReportFamily::Metric => "Every part of an EpisodicMetricReport changes at least one state",
            ReportFamily::Operational => {
                "Every part of an EpisodicOperationalStateReport changes at least one state"
            }
        }
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        let family = self.family;
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            || StateReportVisitor {
                family,
                reports_seen: false,
            },
            self.no_test_data_reason(),
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R5024: no nested descriptors in description modification reports
// ---------------------------------------------------------------------------

/// Judged per received report, without replay.
#[derive(Debug, Default)]
pub struct NoNestedDescriptors;

impl Requirement for NoNestedDescriptors {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R5024
    }

    fn family(&self) -> Family {
        Family::ChangeAuthenticity
    }

    fn description(&self) -> &'static str {
        "Descriptors in description modification reports carry no nested child descriptors"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        let mut aggregator = VerdictAggregator::new();
        let inbound = ctx
            .log
            .messages_for_direction_and_time_range(Direction::Inbound, TimeRange::all());
        for message in inbound {
            let MessageBody::DescriptionModificationReport { parts } = &message.body else {
                continue;
            };
            for descriptor in parts.iter().flat_map(|part| part.descriptors.iter()) {
                let outcome = match descriptor.nested_children().first() {
                    None => SessionOutcome::Satisfied,
                    Some(child) => SessionOutcome::Violated(
                        Failure::new(format!(
                            "{} with handle {} should not have nested descriptor {}",
                            descriptor.kind(),
                            descriptor.handle,
                            child.handle
                        ))
                        .with_handles([descriptor.handle.clone(), child.handle.clone()]),
                    ),
                };
                aggregator.record(outcome);
            }
        }
        Ok(aggregator.finish(NO_NESTING_CANDIDATES))
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R5025_0: parent parts come before child parts
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PartOrdering;

#[derive(Debug, Default)]
struct PartOrderingVisitor {
    relations_seen: bool,
}

impl SessionVisitor for PartOrderingVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let MessageBody::DescriptionModificationReport { parts } = &step.message.body {
            if has_parent_child_parts(parts) {
                self.relations_seen = true;
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.relations_seen)
    }

    fn replay_failed(&mut self, error: ReplayError) -> Result<Failure, ReplayError> {
        match error {
            ReplayError::PartOrder {
                sequence_id,
                mdib_version,
                part,
                child,
                parent,
            } => Ok(Failure {
                reason: format!(
                    "{} is listed before the reportPart containing its parent descriptor '{parent}' in a DescriptionModificationReport.",
                    describe_part(part, child.as_ref())
                ),
                handles: child.into_iter().chain([parent]).collect(),
                sequence_id: Some(sequence_id),
                mdib_version: Some(mdib_version),
            }),
            other => Err(other),
        }
    }
}

impl Requirement for PartOrdering {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R5025_0
    }

    fn family(&self) -> Family {
        Family::ChangeAuthenticity
    }

    fn description(&self) -> &'static str {
        "Report parts holding parent descriptors precede the parts holding their children"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            PartOrderingVisitor::default,
            NO_PARENT_CHILD_PARTS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::test_support::{evaluate, expect_fail};
    use mdib_ir::fixtures::*;
    use mdib_ir::{
        AlertActivation, ComponentActivation, ContextAssociation, Message, MetricCategory,
    };

    fn metric_report(ts: u64, version: u64, activation: ComponentActivation) -> Message {
        state_report(
            ts,
            SEQUENCE_ID,
            version,
            ReportFamily::Metric,
            vec![metric_state(MEASUREMENT_METRIC, activation)
                .with_state_version(version)
                .with_descriptor_version(0)],
        )
    }

    #[test]
    fn changed_metric_states_pass() {
        let verdict = evaluate(
            &StateReportGenuine::new(ReportFamily::Metric),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                metric_report(20, 1, ComponentActivation::StandBy),
                metric_report(30, 2, ComponentActivation::On),
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn unchanged_metric_state_fails() {
        let failure = expect_fail(evaluate(
            &StateReportGenuine::new(ReportFamily::Metric),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                metric_report(20, 1, ComponentActivation::On),
            ],
        ));
        assert_eq!(
            failure.reason,
            format!("The state with the handle {MEASUREMENT_METRIC} from the report has not changed")
        );
        assert_eq!(failure.handles, vec![MEASUREMENT_METRIC.to_string()]);
    }

    fn alert_signals_report(audible: AlertActivation, visible: AlertActivation) -> Message {
        state_report(
            20,
            SEQUENCE_ID,
            1,
            ReportFamily::Alert,
            vec![
                alert_signal_state(AUDIBLE_SIGNAL, audible)
                    .with_state_version(1)
                    .with_descriptor_version(0),
                alert_signal_state(VISIBLE_SIGNAL, visible)
                    .with_state_version(1)
                    .with_descriptor_version(0),
            ],
        )
    }

    #[test]
    fn part_with_one_changed_state_passes() {
        let verdict = evaluate(
            &StateReportGenuine::new(ReportFamily::Alert),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_signals_report(AlertActivation::Paused, AlertActivation::On),
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn part_without_any_change_fails_naming_every_state() {
        let failure = expect_fail(evaluate(
            &StateReportGenuine::new(ReportFamily::Alert),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_signals_report(AlertActivation::On, AlertActivation::On),
            ],
        ));
        assert_eq!(
            failure.handles,
            vec![AUDIBLE_SIGNAL.to_string(), VISIBLE_SIGNAL.to_string()]
        );
        assert!(failure.reason.starts_with("None of the states"));
    }

    #[test]
    fn new_context_states_are_genuine() {
        let verdict = evaluate(
            &StateReportGenuine::new(ReportFamily::Context),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                state_report(
                    20,
                    SEQUENCE_ID,
                    1,
                    ReportFamily::Context,
                    vec![context_state(PATIENT_CONTEXT, "pc0.s1", ContextAssociation::Associated)
                        .with_state_version(0)
                        .with_descriptor_version(0)],
                ),
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn missing_report_family_is_no_test_data() {
        let verdict = evaluate(
            &StateReportGenuine::new(ReportFamily::Operational),
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                metric_report(20, 1, ComponentActivation::StandBy),
            ],
        );
        assert_eq!(
            verdict,
            Verdict::no_test_data("No OperationalStateReports seen during test run, test failed.")
        );
    }

    #[test]
    fn update_without_content_change_fails_c5() {
        let report = description_modification(
            20,
            SEQUENCE_ID,
            1,
            vec![part(
                DescriptionModificationType::Update,
                None,
                vec![channel(CHANNEL).with_version(1)],
                vec![],
            )],
        );
        let failure = expect_fail(evaluate(
            &DescriptionModificationGenuine,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        ));
        assert!(failure.reason.contains("from the report has not changed"));
    }

    #[test]
    fn create_update_and_delete_pass_c5() {
        let report = description_modification(
            20,
            SEQUENCE_ID,
            1,
            vec![
                part(
                    DescriptionModificationType::Create,
                    Some(CHANNEL),
                    vec![numeric_metric("m.new", MetricCategory::Calculation).with_version(0)],
                    vec![metric_state("m.new", ComponentActivation::On)
                        .with_state_version(0)
                        .with_descriptor_version(0)],
                ),
                part(
                    DescriptionModificationType::Update,
                    None,
                    vec![with_type_code(channel(CHANNEL), "MDC_NEW").with_version(1)],
                    vec![],
                ),
                part(
                    DescriptionModificationType::Delete,
                    None,
                    vec![numeric_metric(SETTING_METRIC, MetricCategory::Setting).with_version(0)],
                    vec![],
                ),
            ],
        );
        let verdict = evaluate(
            &DescriptionModificationGenuine,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn nested_descriptor_fails_r5024() {
        let report = description_modification(
            20,
            SEQUENCE_ID,
            1,
            vec![part(
                DescriptionModificationType::Create,
                Some(VMD),
                vec![nest(
                    channel("ch1"),
                    vec![numeric_metric("m.nested", MetricCategory::Measurement)],
                )],
                vec![],
            )],
        );
        let failure = expect_fail(evaluate(
            &NoNestedDescriptors,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        ));
        assert_eq!(
            failure.reason,
            "Channel with handle ch1 should not have nested descriptor m.nested"
        );
    }

    #[test]
    fn no_description_modifications_is_no_test_data_for_r5024() {
        let verdict = evaluate(
            &NoNestedDescriptors,
            vec![standard_baseline(10, SEQUENCE_ID, 0)],
        );
        assert_eq!(verdict, Verdict::no_test_data(NO_NESTING_CANDIDATES));
    }

    fn two_part_create(parent_first: bool) -> Message {
        let parent_part = part(
            DescriptionModificationType::Create,
            Some(VMD),
            vec![channel("ch1").with_version(0)],
            vec![],
        );
        let child_part = part(
            DescriptionModificationType::Create,
            Some("ch1"),
            vec![numeric_metric("m.child", MetricCategory::Measurement).with_version(0)],
            vec![],
        );
        let parts = if parent_first {
            vec![parent_part, child_part]
        } else {
            vec![child_part, parent_part]
        };
        description_modification(20, SEQUENCE_ID, 1, parts)
    }

    #[test]
    fn parent_first_parts_pass_r5025() {
        let verdict = evaluate(
            &PartOrdering,
            vec![standard_baseline(10, SEQUENCE_ID, 0), two_part_create(true)],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn child_first_parts_fail_r5025() {
        let failure = expect_fail(evaluate(
            &PartOrdering,
            vec![standard_baseline(10, SEQUENCE_ID, 0), two_part_create(false)],
        ));
        assert_eq!(failure.handles, vec!["m.child".to_string(), "ch1".to_string()]);
        assert_eq!(failure.mdib_version, Some(1));
        assert!(failure
            .reason
            .starts_with("reportPart containing child descriptor 'm.child' is listed before"));
    }

    #[test]
    fn child_first_part_without_descriptors_names_its_position() {
        let parts = vec![
            part(DescriptionModificationType::Update, Some("ch1"), vec![], vec![]),
            part(
                DescriptionModificationType::Create,
                Some(VMD),
                vec![channel("ch1").with_version(0)],
                vec![],
            ),
        ];
        let failure = expect_fail(evaluate(
            &PartOrdering,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                description_modification(20, SEQUENCE_ID, 1, parts),
            ],
        ));
        assert_eq!(failure.handles, vec!["ch1".to_string()]);
        assert!(failure
            .reason
            .starts_with("reportPart #0 without descriptors is listed before"));
    }
}
