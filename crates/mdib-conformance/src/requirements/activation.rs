//! Hierarchical-Activation: activation states along the containment tree
//! stay consistent after every applied report.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;

use mdib_ir::{
    AlertActivation, AlertSignalManifestation, AlertSignalPrimaryLocation, ComponentActivation,
    ElementKind, Handle, MessageBody, OperatingMode, ReportFamily, StateFamily,
};

use super::{
    evaluate_sessions, EvaluationContext, EvaluationError, Family, Requirement, SessionVisitor,
};
use crate::catalogue;
use crate::replay::Step;
use crate::tree::{Entity, StateTree};
use crate::verdict::{Failure, SessionOutcome, Verdict};

pub const NO_PRESENCE_TRUE: &str = "AlertConditionState/@Presence true was never seen, test failed.";
pub const NO_SYSTEM_SIGNAL_SEQUENCE: &str = "No acceptable sequence seen, test failed";
pub const NO_INACTIVE_ALERT_SYSTEM: &str = "Not enough AlertSystemStates or children seen with the AlertSystemState set to PSD or OFF during test run, test failed.";
pub const NO_COMPONENT_OFF: &str =
    "No pm:AbstractDeviceComponentState/@ActivationState had the value OFF.";

/// Only baselines, description modifications and alert reports change alert
/// states.
fn touches_alerts(step: &Step<'_>) -> bool {
    match &step.message.body {
        MessageBody::GetMdibResponse { .. } | MessageBody::DescriptionModificationReport { .. } => {
            true
        }
        MessageBody::StateReport { family, .. } => *family == ReportFamily::Alert,
        MessageBody::WaveformStream { .. } | MessageBody::Other { .. } => false,
    }
}

fn alert_activation(entity: &Entity) -> Option<AlertActivation> {
    entity.state().and_then(|state| state.alert_activation())
}

fn entities_of_kind(tree: &StateTree, kind: ElementKind) -> impl Iterator<Item = &Entity> {
    tree.entities().filter(move |entity| entity.kind() == kind)
}

// ---------------------------------------------------------------------------
// BICEPS.R0029_0: presence implies an active chain
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PresenceImpliesActivation;

#[derive(Debug, Default)]
struct PresenceVisitor {
    presence_seen: bool,
}

impl SessionVisitor for PresenceVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if !touches_alerts(step) {
            return ControlFlow::Continue(());
        }
        for condition in entities_of_kind(step.after, ElementKind::AlertCondition) {
            let Some(state) = condition.state() else {
                continue;
            };
            if !state.presence() {
                continue;
            }
            self.presence_seen = true;
            let handle = condition.handle();
            let activation = state.alert_activation();
            if activation != Some(AlertActivation::On) {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "AlertConditionState/@Presence is true, for AlertConditionState with handle {handle}. The AlertConditionState/@Activation state should be 'On' but is '{}'",
                        activation.map_or("unknown", |a| a.as_str())
                    ))
                    .with_handles([handle.clone()])
                    .at(step),
                );
            }
            let systems = step
                .after
                .ancestors(handle)
                .into_iter()
                .filter(|ancestor| ancestor.kind() == ElementKind::AlertSystem);
            for system in systems {
                let activation = alert_activation(system);
                if activation != Some(AlertActivation::On) {
                    return ControlFlow::Break(
                        Failure::new(format!(
                            "AlertConditionState/@Presence is true, for AlertConditionState with handle {handle}. The AlertSystemState/@Activation state for AlertSystemState with handle {} should be 'On' but is '{}'",
                            system.handle(),
                            activation.map_or("unknown", |a| a.as_str())
                        ))
                        .with_handles([handle.clone(), system.handle().clone()])
                        .at(step),
                    );
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.presence_seen)
    }
}

impl Requirement for PresenceImpliesActivation {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0029_0
    }

    fn family(&self) -> Family {
        Family::HierarchicalActivation
    }

    fn description(&self) -> &'static str {
        "A present alert condition and its alert systems are activated"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            PresenceVisitor::default,
            NO_PRESENCE_TRUE,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.B-128: system signal activation governs local alert signals
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SystemSignalActivationConsistency;

/// Checks one declared target against the local signals of its
/// manifestation. Returns a diagnostic when the target is not consistent.
pub fn check_signal_target(
    target: AlertActivation,
    signals: &[(&Handle, AlertActivation)],
) -> Result<(), String> {
    for (handle, actual) in signals {
        match target {
            AlertActivation::Paused
                if !matches!(actual, AlertActivation::Paused | AlertActivation::Off) =>
            {
                return Err(format!(
                    "The activation state of the alert signal {handle} is {actual}, but should be OFF or PSD since the alert system activation state is PSD"
                ));
            }
            AlertActivation::Off if *actual != AlertActivation::Off => {
                return Err(format!(
                    "The activation state of the alert signal {handle} is {actual}, but should be OFF since the alert system activation state is OFF"
                ));
            }
            _ => {}
        }
    }

    let all = |wanted: AlertActivation| signals.iter().all(|(_, actual)| *actual == wanted);
    let expected = if signals.iter().any(|(_, actual)| *actual == AlertActivation::On) {
        Some(AlertActivation::On)
    } else if all(AlertActivation::Paused) {
        Some(AlertActivation::Paused)
    } else if all(AlertActivation::Off) {
        Some(AlertActivation::Off)
    } else {
        None
    };
    match expected {
        Some(expected) if expected != target => Err(format!(
            "Expected activation state was {expected}, but actual is {target}"
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
struct SystemSignalVisitor {
    sequence_seen: bool,
}

impl SystemSignalVisitor {
    fn check_system(&mut self, tree: &StateTree, system: &Entity) -> Result<(), Failure> {
        let Some(state) = system.state() else {
            return Ok(());
        };
        let mut targets: BTreeMap<AlertSignalManifestation, Vec<AlertActivation>> =
            BTreeMap::new();
        for declared in state.system_signal_activations() {
            targets
                .entry(declared.manifestation)
                .or_default()
                .push(declared.state);
        }

        let local_signals: Vec<(&Entity, AlertActivation)> = tree
            .children(system.handle())
            .into_iter()
            .filter(|child| child.kind() == ElementKind::AlertSignal)
            .filter_map(|child| {
                let state = child.state()?;
                let local = state.signal_location() == Some(AlertSignalPrimaryLocation::Local);
                local.then_some((child, state.alert_activation()?))
            })
            .collect();

        for (manifestation, declared) in &targets {
            let signals: Vec<(&Handle, AlertActivation)> = local_signals
                .iter()
                .filter(|(entity, _)| entity.descriptor.manifestation() == Some(*manifestation))
                .map(|(entity, activation)| (entity.handle(), *activation))
                .collect();
            if signals.is_empty() {
                continue;
            }
            self.sequence_seen = true;
            let results: Vec<Result<(), String>> = declared
                .iter()
                .map(|target| check_signal_target(*target, &signals))
                .collect();
            if results.iter().any(Result::is_ok) {
                continue;
            }
            let reason = results
                .into_iter()
                .find_map(Result::err)
                .unwrap_or_default();
            let handles = std::iter::once(system.handle().clone())
                .chain(signals.iter().map(|(handle, _)| (*handle).clone()));
            return Err(Failure::new(reason).with_handles(handles));
        }
        Ok(())
    }
}

impl SessionVisitor for SystemSignalVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if !touches_alerts(step) {
            return ControlFlow::Continue(());
        }
        for system in entities_of_kind(step.after, ElementKind::AlertSystem) {
            if let Err(failure) = self.check_system(step.after, system) {
                return ControlFlow::Break(failure.at(step));
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.sequence_seen)
    }
}

impl Requirement for SystemSignalActivationConsistency {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_B_128
    }

    fn family(&self) -> Family {
        Family::HierarchicalActivation
    }

    fn description(&self) -> &'static str {
        "Local alert signals follow the system signal activation declared for their manifestation"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            SystemSignalVisitor::default,
            NO_SYSTEM_SIGNAL_SEQUENCE,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0116: an inactive alert system deactivates its children
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AlertSystemInactivation;

/// A session is evidence once every alert system of the device was seen both
/// `Off` and `Psd`.
#[derive(Debug, Default)]
struct AlertSystemInactivationVisitor {
    systems: BTreeSet<Handle>,
    seeded: bool,
    off_seen: BTreeSet<Handle>,
    paused_seen: BTreeSet<Handle>,
}

impl SessionVisitor for AlertSystemInactivationVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if !touches_alerts(step) {
            return ControlFlow::Continue(());
        }
        if !self.seeded {
            self.seeded = true;
            self.systems.extend(
                entities_of_kind(step.after, ElementKind::AlertSystem)
                    .filter(|system| alert_activation(system).is_some())
                    .map(|system| system.handle().clone()),
            );
        }
        for system in entities_of_kind(step.after, ElementKind::AlertSystem) {
            let Some(expected) = alert_activation(system) else {
                continue;
            };
            let seen = match expected {
                AlertActivation::On => continue,
                AlertActivation::Off => &mut self.off_seen,
                AlertActivation::Paused => &mut self.paused_seen,
            };
            seen.insert(system.handle().clone());
            self.systems.insert(system.handle().clone());
            for child in step.after.children(system.handle()) {
                let Some(actual) = alert_activation(child) else {
                    continue;
                };
                if actual != expected {
                    return ControlFlow::Break(
                        Failure::new(format!(
                            "The activation state of {} should be: {expected} but is: {actual}.",
                            child.handle()
                        ))
                        .with_handles([system.handle().clone(), child.handle().clone()])
                        .at(step),
                    );
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(
            !self.systems.is_empty()
                && self.systems.is_subset(&self.off_seen)
                && self.systems.is_subset(&self.paused_seen),
        )
    }
}

impl Requirement for AlertSystemInactivation {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0116
    }

    fn family(&self) -> Family {
        Family::HierarchicalActivation
    }

    fn description(&self) -> &'static str {
        "Alert conditions and signals share the Off or Psd activation of their alert system"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            AlertSystemInactivationVisitor::default,
            NO_INACTIVE_ALERT_SYSTEM,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0025_0: a component switched off deactivates its descendants
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ComponentOffPropagation;

/// Why a descendant of a switched-off component is not inactive.
fn active_descendant_reason(descendant: &Entity) -> Option<String> {
    let state = descendant.state()?;
    let handle = descendant.handle();
    match state.family() {
        StateFamily::Component | StateFamily::Metric => {
            (state.component_activation() != Some(ComponentActivation::Off)).then(|| {
                format!("The ComponentActivation OFF was not set for the descendant with handle {handle}")
            })
        }
        StateFamily::AlertSystem | StateFamily::AlertCondition | StateFamily::AlertSignal => {
            (state.alert_activation() != Some(AlertActivation::Off)).then(|| {
                format!("The AlertActivation OFF was not set for the descendant with handle {handle}")
            })
        }
        StateFamily::Operation => (state.operating_mode() != Some(OperatingMode::NotAvailable))
            .then(|| format!("The OperatingMode NA was not set for the descendant with handle {handle}")),
        StateFamily::Context => None,
    }
}

#[derive(Debug, Default)]
struct ComponentOffVisitor {
    off_seen: bool,
}

impl SessionVisitor for ComponentOffVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        let switched_off = step.after.entities().filter(|entity| {
            entity.kind().is_component()
                && entity.state().and_then(|state| state.component_activation())
                    == Some(ComponentActivation::Off)
        });
        for component in switched_off {
            self.off_seen = true;
            for descendant in step.after.descendants(component.handle()) {
                if let Some(reason) = active_descendant_reason(descendant) {
                    return ControlFlow::Break(
                        Failure::new(reason)
                            .with_handles([component.handle().clone(), descendant.handle().clone()])
                            .at(step),
                    );
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.off_seen)
    }
}

impl Requirement for ComponentOffPropagation {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0025_0
    }

    fn family(&self) -> Family {
        Family::HierarchicalActivation
    }

    fn description(&self) -> &'static str {
        "Every descendant of a component that is Off is inactive"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            ComponentOffVisitor::default,
            NO_COMPONENT_OFF,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::test_support::{evaluate, expect_fail};
    use mdib_ir::fixtures::*;
    use mdib_ir::{Message, State};

    fn alert_report(ts: u64, version: u64, states: Vec<State>) -> Message {
        let states = states
            .into_iter()
            .map(|state| state.with_state_version(version).with_descriptor_version(0))
            .collect();
        state_report(ts, SEQUENCE_ID, version, ReportFamily::Alert, states)
    }

    fn component_report(ts: u64, version: u64, states: Vec<State>) -> Message {
        let states = states
            .into_iter()
            .map(|state| state.with_state_version(version).with_descriptor_version(0))
            .collect();
        state_report(ts, SEQUENCE_ID, version, ReportFamily::Component, states)
    }

    #[test]
    fn presence_with_active_chain_passes() {
        let verdict = evaluate(
            &PresenceImpliesActivation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_report(
                    20,
                    1,
                    vec![alert_condition_state(ALERT_CONDITION, AlertActivation::On, true)],
                ),
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn presence_under_paused_alert_system_fails() {
        let failure = expect_fail(evaluate(
            &PresenceImpliesActivation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_report(
                    20,
                    1,
                    vec![
                        alert_system_state(ALERT_SYSTEM, AlertActivation::Paused),
                        alert_condition_state(ALERT_CONDITION, AlertActivation::On, true),
                    ],
                ),
            ],
        ));
        assert_eq!(
            failure.handles,
            vec![ALERT_CONDITION.to_string(), ALERT_SYSTEM.to_string()]
        );
        assert!(failure.reason.contains("should be 'On' but is 'Psd'"));
    }

    #[test]
    fn presence_never_true_is_no_test_data() {
        let verdict = evaluate(
            &PresenceImpliesActivation,
            vec![standard_baseline(10, SEQUENCE_ID, 0)],
        );
        assert_eq!(verdict, Verdict::no_test_data(NO_PRESENCE_TRUE));
    }

    #[test]
    fn session_without_presence_does_not_block_a_pass() {
        let other_report = state_report(
            40,
            OTHER_SEQUENCE_ID,
            1,
            ReportFamily::Alert,
            vec![alert_condition_state(ALERT_CONDITION, AlertActivation::On, true)
                .with_state_version(1)
                .with_descriptor_version(0)],
        );
        let verdict = evaluate(
            &PresenceImpliesActivation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                standard_baseline(30, OTHER_SEQUENCE_ID, 0),
                other_report,
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn signal_target_consistency_rules() {
        let aud = "as.aud".to_string();
        let vis = "as.vis".to_string();
        let signals = |a, b| vec![(&aud, a), (&vis, b)];

        assert!(check_signal_target(
            AlertActivation::Paused,
            &signals(AlertActivation::Paused, AlertActivation::Off)
        )
        .is_ok());
        assert!(check_signal_target(
            AlertActivation::On,
            &signals(AlertActivation::On, AlertActivation::Off)
        )
        .is_ok());

        let err = check_signal_target(
            AlertActivation::Off,
            &signals(AlertActivation::Off, AlertActivation::Paused),
        )
        .unwrap_err();
        assert!(err.contains("as.vis is Psd, but should be OFF"));

        let err = check_signal_target(
            AlertActivation::On,
            &signals(AlertActivation::Off, AlertActivation::Off),
        )
        .unwrap_err();
        assert_eq!(err, "Expected activation state was Off, but actual is On");
    }

    #[test]
    fn system_signal_activation_is_satisfiable_with_any_declared_target() {
        let report = alert_report(
            20,
            1,
            vec![
                alert_system_state_with_signals(
                    ALERT_SYSTEM,
                    AlertActivation::On,
                    &[
                        (AlertSignalManifestation::Audible, AlertActivation::Off),
                        (AlertSignalManifestation::Audible, AlertActivation::Paused),
                    ],
                ),
                alert_signal_state(AUDIBLE_SIGNAL, AlertActivation::Paused),
            ],
        );
        let verdict = evaluate(
            &SystemSignalActivationConsistency,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn local_signal_diverging_from_declared_target_fails() {
        let report = alert_report(
            20,
            1,
            vec![alert_system_state_with_signals(
                ALERT_SYSTEM,
                AlertActivation::On,
                &[(AlertSignalManifestation::Visible, AlertActivation::Off)],
            )],
        );
        let failure = expect_fail(evaluate(
            &SystemSignalActivationConsistency,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        ));
        assert_eq!(
            failure.handles,
            vec![ALERT_SYSTEM.to_string(), VISIBLE_SIGNAL.to_string()]
        );
    }

    #[test]
    fn remote_signals_are_exempt() {
        let report = alert_report(
            20,
            1,
            vec![
                alert_system_state_with_signals(
                    ALERT_SYSTEM,
                    AlertActivation::On,
                    &[(AlertSignalManifestation::Visible, AlertActivation::Off)],
                ),
                remote_alert_signal_state(VISIBLE_SIGNAL, AlertActivation::On),
            ],
        );
        let verdict = evaluate(
            &SystemSignalActivationConsistency,
            vec![standard_baseline(10, SEQUENCE_ID, 0), report],
        );
        assert_eq!(verdict, Verdict::no_test_data(NO_SYSTEM_SIGNAL_SEQUENCE));
    }

    fn alert_system_switched(ts: u64, version: u64, activation: AlertActivation) -> Message {
        alert_report(
            ts,
            version,
            vec![
                alert_system_state(ALERT_SYSTEM, activation),
                alert_condition_state(ALERT_CONDITION, activation, false),
                alert_signal_state(AUDIBLE_SIGNAL, activation),
                alert_signal_state(VISIBLE_SIGNAL, activation),
            ],
        )
    }

    #[test]
    fn alert_system_seen_off_and_paused_with_matching_children_passes() {
        let verdict = evaluate(
            &AlertSystemInactivation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_system_switched(20, 1, AlertActivation::Paused),
                alert_system_switched(30, 2, AlertActivation::Off),
            ],
        );
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn alert_system_only_ever_off_is_no_test_data() {
        let verdict = evaluate(
            &AlertSystemInactivation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                alert_system_switched(20, 1, AlertActivation::Off),
            ],
        );
        assert_eq!(verdict, Verdict::no_test_data(NO_INACTIVE_ALERT_SYSTEM));
    }

    #[test]
    fn every_alert_system_must_reach_both_states() {
        let second_system = nest(
            alert_system("asy.mds1"),
            vec![alert_condition("ac.mds1")],
        );
        let mut descriptors = standard_descriptors();
        descriptors.push(nest(mds("mds1"), vec![second_system]));
        let mut states = standard_states();
        states.extend([
            component_state("mds1", ComponentActivation::On),
            alert_system_state("asy.mds1", AlertActivation::On),
            alert_condition_state("ac.mds1", AlertActivation::On, false),
        ]);
        let verdict = evaluate(
            &AlertSystemInactivation,
            vec![
                baseline(10, SEQUENCE_ID, 0, descriptors, states),
                alert_system_switched(20, 1, AlertActivation::Paused),
                alert_system_switched(30, 2, AlertActivation::Off),
            ],
        );
        assert_eq!(verdict, Verdict::no_test_data(NO_INACTIVE_ALERT_SYSTEM));
    }

    #[test]
    fn paused_alert_system_requires_paused_children() {
        let lagging = alert_report(
            20,
            1,
            vec![
                alert_system_state(ALERT_SYSTEM, AlertActivation::Off),
                alert_condition_state(ALERT_CONDITION, AlertActivation::Off, false),
            ],
        );
        let failure = expect_fail(evaluate(
            &AlertSystemInactivation,
            vec![standard_baseline(10, SEQUENCE_ID, 0), lagging],
        ));
        assert_eq!(
            failure.reason,
            format!("The activation state of {AUDIBLE_SIGNAL} should be: Off but is: On.")
        );
    }

    #[test]
    fn switched_off_vmd_requires_inactive_descendants() {
        let failure = expect_fail(evaluate(
            &ComponentOffPropagation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                component_report(
                    20,
                    1,
                    vec![
                        component_state(VMD, ComponentActivation::Off),
                        component_state(CHANNEL, ComponentActivation::Off),
                    ],
                ),
            ],
        ));
        assert_eq!(
            failure.reason,
            format!("The ComponentActivation OFF was not set for the descendant with handle {MEASUREMENT_METRIC}")
        );
    }

    #[test]
    fn switched_off_sco_requires_unavailable_operations() {
        let failure = expect_fail(evaluate(
            &ComponentOffPropagation,
            vec![
                standard_baseline(10, SEQUENCE_ID, 0),
                component_report(20, 1, vec![component_state(SCO, ComponentActivation::Off)]),
            ],
        ));
        assert_eq!(failure.handles, vec![SCO.to_string(), SET_OPERATION.to_string()]);
    }

    #[test]
    fn switched_off_sco_with_unavailable_operations_passes() {
        let states = standard_states()
            .into_iter()
            .map(|state| match state.descriptor_handle.as_str() {
                SCO => component_state(SCO, ComponentActivation::Off),
                SET_OPERATION => operation_state(SET_OPERATION, OperatingMode::NotAvailable),
                _ => state,
            })
            .collect();
        let verdict = evaluate(
            &ComponentOffPropagation,
            vec![baseline(10, SEQUENCE_ID, 0, standard_descriptors(), states)],
        );
        assert_eq!(verdict, Verdict::Pass);
    }
}
