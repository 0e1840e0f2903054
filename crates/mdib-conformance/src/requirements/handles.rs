//! Handle-Integrity: descriptor and multi-state handles stay unique and
//! printable in every mdib version of a session.
//!
//! Two descriptors sharing a handle never reach a visitor: the tree rejects
//! them while replaying. What remains observable is the handle of a context
//! state colliding with another handle.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::ControlFlow;

use mdib_ir::{ContextAssociation, ElementKind, Handle};

use super::{
    evaluate_sessions, EvaluationContext, EvaluationError, Family, Requirement, SessionVisitor,
};
use crate::catalogue;
use crate::replay::Step;
use crate::tree::StateTree;
use crate::verdict::{Failure, SessionOutcome, Verdict};

pub const NO_HANDLES: &str = "No Data to perform test on";
pub const NO_CONTEXT_SEQUENCE: &str =
    "No Sequence with two different context states for each context descriptor associated seen.";

/// Handles of the context states in the tree. A context state without its
/// own handle has nothing to compare.
fn multi_state_handles(tree: &StateTree) -> impl Iterator<Item = &Handle> {
    tree.entities()
        .filter(|entity| matches!(entity.kind(), ElementKind::Context(_)))
        .flat_map(|entity| entity.states.iter())
        .filter_map(|state| state.handle.as_ref())
}

fn is_printable_ascii(handle: &str) -> bool {
    handle.bytes().all(|byte| (0x21..=0x7e).contains(&byte))
}

// ---------------------------------------------------------------------------
// BICEPS.R0007_0: every handle is unique within an mdib version
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct UniqueHandles;

#[derive(Debug, Default)]
struct UniqueHandlesVisitor {
    handles_seen: bool,
}

impl SessionVisitor for UniqueHandlesVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        let mut handles: HashSet<&str> = step
            .after
            .entities()
            .map(|entity| entity.handle().as_str())
            .collect();
        self.handles_seen |= !handles.is_empty();
        for handle in multi_state_handles(step.after) {
            if !handles.insert(handle.as_str()) {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "contextState handle '{handle}' is not unique in Mdib version {}.",
                        step.mdib_version()
                    ))
                    .with_handles([handle.clone()])
                    .at(step),
                );
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.handles_seen)
    }
}

impl Requirement for UniqueHandles {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0007_0
    }

    fn family(&self) -> Family {
        Family::HandleIntegrity
    }

    fn description(&self) -> &'static str {
        "All handles are unique within every mdib version"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            UniqueHandlesVisitor::default,
            NO_HANDLES,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0105_0: handles use printable ASCII only
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PrintableHandles;

#[derive(Debug, Default)]
struct PrintableHandlesVisitor {
    handles_seen: bool,
}

impl SessionVisitor for PrintableHandlesVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        for entity in step.after.entities() {
            self.handles_seen = true;
            let handle = entity.handle();
            if !is_printable_ascii(handle) {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "Invalid descriptor handle {handle} found in mdib version {}",
                        step.mdib_version()
                    ))
                    .with_handles([handle.clone()])
                    .at(step),
                );
            }
        }
        for handle in multi_state_handles(step.after) {
            if !is_printable_ascii(handle) {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "Invalid multi state handle {handle} found in mdib version {}",
                        step.mdib_version()
                    ))
                    .with_handles([handle.clone()])
                    .at(step),
                );
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(self.handles_seen)
    }
}

impl Requirement for PrintableHandles {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0105_0
    }

    fn family(&self) -> Family {
        Family::HandleIntegrity
    }

    fn description(&self) -> &'static str {
        "Handles only use ASCII characters 0x21 to 0x7E"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            PrintableHandlesVisitor::default,
            NO_HANDLES,
        )
    }
}

// ---------------------------------------------------------------------------
// BICEPS.R0097: multi-state handles are unique and disjoint from descriptor
// handles within a session
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MultiStateHandles;

#[derive(Debug, Default)]
struct MultiStateHandlesVisitor {
    /// Every descriptor handle seen in the session so far.
    descriptor_handles: HashSet<Handle>,
    /// Every multi-state handle seen in the session so far.
    state_handles: HashSet<Handle>,
    /// Context descriptor -> handles of the states seen associated with it.
    associated: BTreeMap<Handle, BTreeSet<Handle>>,
    seeded: bool,
}

impl MultiStateHandlesVisitor {
    fn seed(&mut self, tree: &StateTree) {
        self.seeded = true;
        for entity in tree.entities() {
            if matches!(entity.kind(), ElementKind::Context(_)) {
                self.associated.entry(entity.handle().clone()).or_default();
            }
        }
    }
}

impl SessionVisitor for MultiStateHandlesVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if !self.seeded {
            self.seed(step.after);
        }
        self.descriptor_handles
            .extend(step.after.entities().map(|entity| entity.handle().clone()));

        let mut current: HashSet<&Handle> = HashSet::new();
        for handle in multi_state_handles(step.after) {
            if !current.insert(handle) {
                return ControlFlow::Break(
                    Failure::new(format!(
                        "Multi state handle {handle} is not unique in MdibVersion {}.",
                        step.mdib_version()
                    ))
                    .with_handles([handle.clone()])
                    .at(step),
                );
            }
        }
        if current.is_empty() {
            return ControlFlow::Continue(());
        }
        for entity in step.after.entities() {
            for state in &entity.states {
                let Some(handle) = &state.handle else {
                    continue;
                };
                self.state_handles.insert(handle.clone());
                if state.context_association() == Some(ContextAssociation::Associated) {
                    self.associated
                        .entry(entity.handle().clone())
                        .or_default()
                        .insert(handle.clone());
                }
            }
        }

        let mut overlap: Vec<&Handle> = self
            .descriptor_handles
            .intersection(&self.state_handles)
            .collect();
        if !overlap.is_empty() {
            overlap.sort();
            return ControlFlow::Break(
                Failure::new(format!(
                    "Descriptor and state handles are not disjunctive. Overlapping handles:[{}]. In MdibVersion: {}",
                    overlap.iter().map(|h| h.as_str()).collect::<Vec<_>>().join(", "),
                    step.mdib_version()
                ))
                .with_handles(overlap.into_iter().cloned())
                .at(step),
            );
        }
        ControlFlow::Continue(())
    }

    /// Every context descriptor must have had two different associated
    /// states during the session.
    fn outcome(&self) -> SessionOutcome {
        SessionOutcome::from_evidence(
            !self.associated.is_empty()
                && self.associated.values().all(|handles| handles.len() > 1),
        )
    }
}

impl Requirement for MultiStateHandles {
    fn id(&self) -> &'static str {
        catalogue::BICEPS_R0097
    }

    fn family(&self) -> Family {
        Family::HandleIntegrity
    }

    fn description(&self) -> &'static str {
        "Multi-state handles are unique and disjoint from descriptor handles"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        evaluate_sessions(
            self.id(),
            ctx.sessions,
            MultiStateHandlesVisitor::default,
            NO_CONTEXT_SEQUENCE,
        )
    }
}
