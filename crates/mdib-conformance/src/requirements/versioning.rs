//! Version-Monotonicity: descriptor, state and mdib versions move forward
//! whenever content changes and never move back.
//!
//! Every requirement here also fails on a version that is not transmitted
//! although its handle was already observed.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use mdib_ir::{DescriptionModificationType, Descriptor, Handle, Message, MessageBody, State};

use super::{
    evaluate_sessions, implied_version_failure, EvaluationContext, EvaluationError, Family,
    Requirement, SessionVisitor,
};
use crate::catalogue;
use crate::equality::{child_set, descriptor_content_eq, state_content_eq};
use crate::replay::Step;
use crate::verdict::{Failure, SessionOutcome, Verdict};

pub const NO_DESCRIPTOR_CHANGE: &str = "No descriptor changed during the test run.";
pub const NO_STATE_CHANGE: &str = "No state changed during the test run.";
pub const NO_VERSIONS_VERIFIED: &str = "No state versions have been verified.";
pub const NO_CREATE_PARTS: &str =
    "No report parts with description modification type crt seen during test run, test failed";
pub const NO_UPDATE_PARTS: &str =
    "No report parts with description modification type upt seen during test run, test failed";

/// Baselines and description modifications are the only messages that can
/// change descriptors or remove states.
fn is_structural(message: &Message) -> bool {
    matches!(
        message.body,
        MessageBody::GetMdibResponse { .. } | MessageBody::DescriptionModificationReport { .. }
    )
}

/// Handles removed by a delete part of a description modification.
fn deleted_in(message: &Message) -> HashSet<&Handle> {
    let MessageBody::DescriptionModificationReport { parts } = &message.body else {
        return HashSet::new();
    };
    parts
        .iter()
        .filter(|part| part.modification() == DescriptionModificationType::Delete)
        .flat_map(|part| part.descriptors.iter().map(|descriptor| &descriptor.handle))
        .collect()
}

// ---------------------------------------------------------------------------
// BICEPS.R0033: child set changes bump the parent's descriptor version
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ChildSetVersioning;

#[derive(Debug, Default)]
struct ChildSetVisitor {
    changes_seen: bool,
}

impl SessionVisitor for ChildSetVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let Some(failure) = implied_version_failure(step) {
            return ControlFlow::Break(failure);
        }
        if !is_structural(step.message) {
            return ControlFlow::Continue(());
        }
        for previous in step.before.entities() {
            let Some(current) = step.after.entity(previous.handle()) else {
                continue;
            };
            if child_set(previous) == child_set(current) {
                continue;
            }
            self.changes_seen = true;
            if current.descriptor_version() <= previous.descriptor_version() {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "Descriptor version has not changed, but children have. MdibVersions {} and {}. Descriptor handle {}.",
                        step.before.mdib_version(),
                        step.after.mdib_version(),
                        previous.handle()
                    ))
                    .with_handles([previous.handle().clone()])
                    .at(step),
                );
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.changes_seen)
    }
}

impl Requirement for ChildSetVersioning {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0033
    }

    fn family(&self) -> Family {
        Family::VersionMonotonicity
    }

    fn description(&self) -> &'static str {
        "A change of a descriptor's child set increments its descriptor version"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            ChildSetVisitor::default,
            NO_DESCRIPTOR_CHANGE,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0034_0: descriptor content changes bump the descriptor version
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DescriptorContentVersioning;

#[derive(Debug, Default)]
struct DescriptorContentVisitor {
    changes_seen: bool,
    /// Last known incarnation of deleted descriptors.
    retired: HashMap<Handle, Descriptor>,
}

impl SessionVisitor for DescriptorContentVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let Some(failure) = implied_version_failure(step) {
            return ControlFlow::Break(failure);
        }
        if !is_structural(step.message) {
            return ControlFlow::Continue(());
        }
        let deleted_here = deleted_in(step.message);
        for current in step.after.entities() {
            let handle = current.handle();
            let (previous, reinserted) = match step.before.descriptor(handle) {
                Some(previous) => (previous, deleted_here.contains(handle)),
                None => match self.retired.get(handle) {
                    Some(previous) => (previous, true),
                    None => continue,
                },
            };
            if descriptor_content_eq(previous, &current.descriptor) {
                continue;
            }
            self.changes_seen = true;
            let old = previous.descriptor_version.unwrap_or(0);
            let new = current.descriptor_version();
            if new > old {
                continue;
            }
            let reason = if reinserted {
                format!(
                    "Descriptor {handle} was reinserted with changed content in MdibVersion {}, but its descriptor version {new} is not greater than {old}.",
                    step.mdib_version()
                )
            } else {
                format!(
                    "Descriptor version has not been incremented, but descriptor has changed. MdibVersion {}, descriptor handle {handle}, version was {old} and is now {new}.",
                    step.mdib_version()
                )
            };
            return ControlFlow::Break(Failure::new(reason).with_handles([handle.clone()]).at(step));
        }
        for previous in step.before.entities() {
            if !step.after.contains(previous.handle()) {
                self.retired
                    .insert(previous.handle().clone(), previous.descriptor.clone());
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.changes_seen)
    }
}

impl Requirement for DescriptorContentVersioning {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0034_0
    }

    fn family(&self) -> Family {
        Family::VersionMonotonicity
    }

    fn description(&self) -> &'static str {
        "A change of descriptor content increments the descriptor version, also across reinsertion"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            DescriptorContentVisitor::default,
            NO_DESCRIPTOR_CHANGE,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0038_0: state content changes bump the state version
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StateContentVersioning;

#[derive(Debug, Default)]
struct StateContentVisitor {
    changes_seen: bool,
    retired: HashMap<Handle, State>,
}

impl StateContentVisitor {
    fn check(&mut self, step: &Step<'_>, key: &Handle) -> Result<(), Failure> {
        let Some(current) = step.after.state(key) else {
            return Ok(());
        };
        let (previous, reinserted) = match step.before.state(key) {
            Some(previous) => (previous, false),
            None => match self.retired.get(key) {
                Some(previous) => (previous, true),
                None => return Ok(()),
            },
        };
        if state_content_eq(previous, current) {
            return Ok(());
        }
        self.changes_seen = true;
        let old = previous.state_version.unwrap_or(0);
        let new = current.state_version.unwrap_or(0);
        if new > old {
            return Ok(());
        }
        let reason = if reinserted {
            format!(
                "State {key} was reinserted with changed content in MdibVersion {}, but its state version {new} is not greater than {old}.",
                step.mdib_version()
            )
        } else {
            format!(
                "State version has not been incremented, but state has changed. MdibVersion {}, state handle {key}, version was {old} and is now {new}.",
                step.mdib_version()
            )
        };
        Err(Failure::new(reason).with_handles([key.clone()]).at(step))
    }
}

impl SessionVisitor for StateContentVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let Some(failure) = implied_version_failure(step) {
            return ControlFlow::Break(failure);
        }
        let keys: Vec<Handle> = if is_structural(step.message) {
            step.after.states().map(|state| state.key().clone()).collect()
        } else {
            step.message
                .reported_states()
                .into_iter()
                .map(|state| state.key().clone())
                .collect()
        };
        for key in &keys {
            if let Err(failure) = self.check(step, key) {
                return ControlFlow::Break(failure);
            }
        }
        if is_structural(step.message) {
            for previous in step.before.states() {
                if step.after.state(previous.key()).is_none() {
                    self.retired.insert(previous.key().clone(), previous.clone());
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.changes_seen)
    }
}

impl Requirement for StateContentVersioning {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0038_0
    }

    fn family(&self) -> Family {
        Family::VersionMonotonicity
    }

    fn description(&self) -> &'static str {
        "A change of state content increments the state version, also across reinsertion"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            StateContentVisitor::default,
            NO_STATE_CHANGE,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R5003: versions never decrease
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VersionsNeverDecrease;

#[derive(Debug, Default)]
struct NeverDecreaseVisitor {
    verified: bool,
}

impl SessionVisitor for NeverDecreaseVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let Some(issue) = step.issues.first() {
            return ControlFlow::Break(
                Failure::new(issue.to_string())
                    .with_handles([issue.handle.clone()])
                    .at(step),
            );
        }
        if !step.before.is_empty() && step.after.mdib_version() < step.before.mdib_version() {
            return ControlFlow::Break(
                Failure::new(format!(
                    "The MdibVersion has been decremented. It was {} and is now {}.",
                    step.before.mdib_version(),
                    step.after.mdib_version()
                ))
                .at(step),
            );
        }
        if step.after.states().next().is_some() {
            self.verified = true;
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.verified)
    }
}

impl Requirement for VersionsNeverDecrease {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R5003
    }

    fn family(&self) -> Family {
        Family::VersionMonotonicity
    }

    fn description(&self) -> &'static str {
        "Descriptor, state and mdib versions never decrease within a session"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            NeverDecreaseVisitor::default,
            NO_VERSIONS_VERIFIED,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R5051 / BICEPS.R5052: part states carry their descriptor's version
// ---------------------------------------------------------------------------

/// States in create (R5051) or update (R5052) parts reference the version of
/// the descriptor they belong to.
#[derive(Debug)]
pub struct PartStateDescriptorVersion {
    modification: DescriptionModificationType,
}

impl PartStateDescriptorVersion {
    pub fn created() -> Self {
        Self {
            modification: DescriptionModificationType::Create,
        }
    }

    pub fn updated() -> Self {
        Self {
            modification: DescriptionModificationType::Update,
        }
    }
}

#[derive(Debug)]
struct PartStateVisitor {
    modification: DescriptionModificationType,
    parts_seen: bool,
}

impl SessionVisitor for PartStateVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if let Some(failure) = implied_version_failure(step) {
            return ControlFlow::Break(failure);
        }
        let MessageBody::DescriptionModificationReport { parts } = &step.message.body else {
            return ControlFlow::Continue(());
        };
        for part in parts.iter().filter(|p| p.modification() == self.modification) {
            self.parts_seen = true;
            for reported in &part.states {
                let key = reported.key();
                let (Some(state), Some(descriptor)) = (
                    step.after.state(key),
                    step.after.entity(&reported.descriptor_handle),
                ) else {
                    continue;
                };
                let actual = state.descriptor_version.unwrap_or(0);
                let expected = descriptor.descriptor_version();
                if actual != expected {
                    return ControlFlow::Break(
                        Failure::new(format!(
                            "The descriptor version of state {key} is {actual}, but should be {expected}, in MdibVersion {}.",
                            step.mdib_version()
                        ))
                        .with_handles([key.clone()])
                        .at(step),
                    );
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.parts_seen)
    }
}

impl Requirement for PartStateDescriptorVersion {
    fn id(&self) -> &'static str {
        match self.modification {
            DescriptionModificationType::Create => catalogue::BICEPS_R5051,
            _ => catalogue::BICEPS_R5052,
        }
    }

    fn family(&self) -> Family {
        Family::VersionMonotonicity
    }

    fn description(&self) -> &'static str {
        match self.modification {
            DescriptionModificationType::Create => {
                "States in create parts carry the descriptor version of their descriptor"
            }
            _ => "States in update parts carry the descriptor version of their descriptor",
        }
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        let modification = self.modification;
        let reason = match modification {
            DescriptionModificationType::Create => NO_CREATE_PARTS,
            _ => NO_UPDATE_PARTS,
        };
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            || PartStateVisitor {
                modification,
                parts_seen: false,
            },
            reason,
        )
    }
}
