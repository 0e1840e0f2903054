//! Context-Association: a patient or location context descriptor never has
//! more than one associated state at a time.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;

use mdib_ir::{ContextAssociation, ContextKind, ElementKind, Handle, MessageBody, ReportFamily};

use super::{
    evaluate_sessions, EvaluationContext, EvaluationError, Family, Requirement, SessionVisitor,
};
use crate::catalogue;
use crate::replay::Step;
use crate::verdict::{Failure, SessionOutcome, Verdict};

pub const NOT_ENOUGH_PATIENTS: &str = "No or not enough patients were associated during the test run. At least two different associated patient context states are required for a single patient context descriptor in a single sequence.";
pub const NOT_ENOUGH_LOCATIONS: &str = "No or not enough locations were associated during the test run. At least two different associated location context states are required for a single location context descriptor in a single sequence.";

/// Only baselines, description modifications and context reports change
/// context states.
fn touches_contexts(step: &Step<'_>) -> bool {
    match &step.message.body {
        MessageBody::GetMdibResponse { .. } | MessageBody::DescriptionModificationReport { .. } => {
            true
        }
        MessageBody::StateReport { family, .. } => *family == ReportFamily::Context,
        MessageBody::WaveformStream { .. } | MessageBody::Other { .. } => false,
    }
}

/// Which context descriptors must have seen two associations for a session
/// to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quorum {
    AnyDescriptor,
    EveryDescriptor,
}

// ---------------------------------------------------------------------------
// BICEPS.R0124 / BICEPS.R0133: at most one associated state per descriptor
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SingleAssociation {
    id: &'static str,
    kind: ContextKind,
    quorum: Quorum,
}

impl SingleAssociation {
    pub fn patient() -> Self {
        Self {
            id: catalogue::BICEPS_R0124,
            kind: ContextKind::Patient,
            quorum: Quorum::AnyDescriptor,
        }
    }

    pub fn location() -> Self {
        Self {
            id: catalogue::BICEPS_R0133,
            kind: ContextKind::Location,
            quorum: Quorum::EveryDescriptor,
        }
    }
}

#[derive(Debug)]
struct SingleAssociationVisitor {
    kind: ContextKind,
    quorum: Quorum,
    /// Context descriptor -> every state handle seen as its sole association.
    associated: BTreeMap<Handle, BTreeSet<Handle>>,
}

impl SessionVisitor for SingleAssociationVisitor {
    fn visit(&mut self, step: &Step<'_>) -> ControlFlow<Failure> {
        if !touches_contexts(step) {
            return ControlFlow::Continue(());
        }
        let descriptors = step
            .after
            .entities()
            .filter(|entity| entity.kind() == ElementKind::Context(self.kind));
        for descriptor in descriptors {
            let associated: Vec<&Handle> = descriptor
                .states
                .iter()
                .filter(|state| state.context_association() == Some(ContextAssociation::Associated))
                .map(|state| state.key())
                .collect();
            match associated.as_slice() {
                [] => {}
                [only] => {
                    self.associated
                        .entry(descriptor.handle().clone())
                        .or_default()
                        .insert((*only).clone());
                }
                several => {
                    return ControlFlow::Break(
                        Failure::new(format!(
                            "More than one {}ContextState was associated for the handle {}, associated state handles were {}, mdib version {}",
                            self.kind,
                            descriptor.handle(),
                            several.iter().map(|h| h.as_str()).collect::<Vec<_>>().join(", "),
                            step.mdib_version()
                        ))
                        .with_handles(
                            std::iter::once(descriptor.handle()).chain(several.iter().copied()).cloned(),
                        )
                        .at(step),
                    );
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn outcome(&self) -> SessionOutcome {
        let switched = |handles: &BTreeSet<Handle>| handles.len() >= 2;
        let enough = match self.quorum {
            Quorum::AnyDescriptor => self.associated.values().any(switched),
            Quorum::EveryDescriptor => {
                !self.associated.is_empty() && self.associated.values().all(switched)
            }
        };
        SessionOutcome::from_evidence(enough)
    }
}

impl Requirement for SingleAssociation {
    fn id(&self) -> &'static str {
        self.id
    }

    fn family(&self) -> Family {
        Family::ContextAssociation
    }

    fn description(&self) -> &'static str {
        match self.kind {
            ContextKind::Location => "A location context descriptor has at most one associated state",
            _ => "A patient context descriptor has at most one associated state",
        }
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        let reason = match self.kind {
            ContextKind::Location => NOT_ENOUGH_LOCATIONS,
            _ => NOT_ENOUGH_PATIENTS,
        };
        evaluate_sessions(
            self.id,
            ctx.sessions,
            || SingleAssociationVisitor {
                kind: self.kind,
                quorum: self.quorum,
                associated: BTreeMap::new(),
            },
            reason,
        )
    }
}
