//! Session partitioning and message-by-message reconstruction of the tree.
//!
//! Inbound messages are grouped by sequence id. Each session starts at its
//! first `GetMdibResponse`; every following report is applied in arrival
//! order and handed to a visitor together with the tree before and after it.

use std::fmt;
use std::ops::ControlFlow;

use indexmap::IndexMap;
use mdib_ir::{
    DescriptionModificationPart, DescriptionModificationType, Descriptor, Direction, Handle,
    Message, MessageBody, MessageLog, ReportFamily, State, StateFamily, TimeRange, Version,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::ledger::{VersionKind, VersionLedger, VersionProblem};
use crate::tree::{StateTree, StructureError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("session {sequence_id} has no GetMdibResponse to start from")]
    MissingBaseline { sequence_id: String },
    #[error(
        "report with mdib version {report_version} in session {sequence_id} is older than the current mdib version {current_version}"
    )]
    StaleReport {
        sequence_id: String,
        report_version: Version,
        current_version: Version,
    },
    #[error(
        "{} is listed before the reportPart containing its parent descriptor '{parent}' (session {sequence_id}, mdib version {mdib_version})",
        describe_part(*.part, .child.as_ref())
    )]
    PartOrder {
        sequence_id: String,
        mdib_version: Version,
        /// Zero-based position of the offending part in the report.
        part: usize,
        /// First descriptor of the offending part, if it carries any.
        child: Option<Handle>,
        parent: Handle,
    },
    #[error("{source} (session {sequence_id}, mdib version {mdib_version})")]
    Structure {
        sequence_id: String,
        mdib_version: Version,
        #[source]
        source: StructureError,
    },
}

impl ReplayError {
    /// Errors that are themselves a protocol violation judged by a
    /// requirement, as opposed to input that cannot be replayed at all.
    pub fn is_requirement_violation(&self) -> bool {
        matches!(self, ReplayError::PartOrder { .. })
    }
}

/// Names a report part by its first descriptor, or by position when it
/// carries none.
pub fn describe_part(part: usize, child: Option<&Handle>) -> String {
    match child {
        Some(child) => format!("reportPart containing child descriptor '{child}'"),
        None => format!("reportPart #{part} without descriptors"),
    }
}

/// A part naming a parent that only a later part of the same report carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisorderedPart {
    pub part: usize,
    pub child: Option<Handle>,
    pub parent: Handle,
}

/// A version that broke the ledger rules during one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionIssue {
    pub handle: Handle,
    pub kind: VersionKind,
    pub mdib_version: Version,
    pub problem: VersionProblem,
}

impl VersionIssue {
    pub fn is_implied_after_observed(&self) -> bool {
        matches!(self.problem, VersionProblem::ImpliedAfterObserved { .. })
    }
}

impl fmt::Display for VersionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            VersionProblem::ImpliedAfterObserved { .. } => write!(
                f,
                "The {} for handle {} is null but was not allowed to be. It occurred previously without an implied value.",
                self.kind, self.handle
            ),
            VersionProblem::Decreased { previous, current } => write!(
                f,
                "The {} of {} has been decremented in MdibVersion {}. It was {} and is now {}.",
                self.kind, self.handle, self.mdib_version, previous, current
            ),
        }
    }
}

/// One applied message as seen by a visitor.
#[derive(Debug)]
pub struct Step<'a> {
    /// Position of the message within its session.
    pub index: usize,
    pub message: &'a Message,
    pub before: &'a StateTree,
    pub after: &'a StateTree,
    pub issues: &'a [VersionIssue],
}

impl Step<'_> {
    pub fn sequence_id(&self) -> &str {
        self.after.sequence_id()
    }

    pub fn mdib_version(&self) -> Version {
        self.after.mdib_version()
    }
}

/// The inbound, MDIB-relevant messages of one sequence id, in arrival order.
#[derive(Debug, Clone)]
pub struct SessionHistory<'l> {
    pub sequence_id: String,
    pub messages: Vec<&'l Message>,
}

/// Splits the inbound traffic of `log` into sessions, ordered by first
/// appearance.
pub fn partition_sessions(log: &dyn MessageLog) -> Vec<SessionHistory<'_>> {
    let mut sessions: IndexMap<&str, Vec<&Message>> = IndexMap::new();
    for message in log.messages_for_direction_and_time_range(Direction::Inbound, TimeRange::all())
    {
        if !message.is_mdib_relevant() {
            continue;
        }
        sessions
            .entry(message.sequence_id.as_str())
            .or_default()
            .push(message);
    }
    sessions
        .into_iter()
        .map(|(sequence_id, messages)| SessionHistory {
            sequence_id: sequence_id.to_string(),
            messages,
        })
        .collect()
}

/// Drops reports older than the initial baseline until the first report with
/// a strictly newer mdib version arrives.
#[derive(Debug, Clone, Copy)]
struct InitialVersionGate {
    initial: Version,
    open: bool,
}

impl InitialVersionGate {
    fn admits(&mut self, version: Version) -> bool {
        if self.open {
            return true;
        }
        if version > self.initial {
            self.open = true;
        }
        version >= self.initial
    }
}

impl SessionHistory<'_> {
    /// Replays the session, calling `visit` after every applied message.
    ///
    /// Returns early with the visitor's `Break` value. Any inconsistency in
    /// the log aborts the replay with an error.
    pub fn replay<B>(
        &self,
        mut visit: impl FnMut(&Step<'_>) -> ControlFlow<B>,
    ) -> Result<ControlFlow<B>, ReplayError> {
        let start = self
            .messages
            .iter()
            .position(|message| message.is_baseline())
            .ok_or_else(|| ReplayError::MissingBaseline {
                sequence_id: self.sequence_id.clone(),
            })?;
        if start > 0 {
            debug!(
                sequence_id = %self.sequence_id,
                skipped = start,
                "ignoring reports received before the first baseline"
            );
        }

        let mut gate = InitialVersionGate {
            initial: self.messages[start].version(),
            open: false,
        };
        let mut replayer = Replayer::new(&self.sequence_id);
        for (index, message) in self.messages.iter().enumerate().skip(start) {
            if !message.is_baseline() && !gate.admits(message.version()) {
                debug!(
                    sequence_id = %self.sequence_id,
                    mdib_version = message.version(),
                    "dropping report older than the initial baseline"
                );
                continue;
            }
            let before = replayer.tree().clone();
            let issues = replayer.apply(message)?;
            let step = Step {
                index,
                message,
                before: &before,
                after: replayer.tree(),
                issues: &issues,
            };
            if let ControlFlow::Break(value) = visit(&step) {
                return Ok(ControlFlow::Break(value));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

// ---------------------------------------------------------------------------
// Message application
// ---------------------------------------------------------------------------

/// Applies messages of one session to its tree and version ledger.
#[derive(Debug, Clone)]
pub struct Replayer {
    tree: StateTree,
    ledger: VersionLedger,
}

impl Replayer {
    pub fn new(sequence_id: &str) -> Self {
        Self {
            tree: StateTree::new(sequence_id, 0),
            ledger: VersionLedger::new(),
        }
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Applies one message and returns the version issues it raised.
    pub fn apply(&mut self, message: &Message) -> Result<Vec<VersionIssue>, ReplayError> {
        let version = message.version();
        let mut issues = Vec::new();
        match &message.body {
            MessageBody::GetMdibResponse { mdib } => {
                // A later baseline re-seeds the tree; the ledger stays.
                let mut tree = StateTree::new(self.tree.sequence_id(), version);
                let mut seen = std::collections::HashSet::new();
                for root in &mdib.descriptors {
                    self.insert_nested(&mut tree, root, None, version, &mut issues)?;
                }
                for state in &mdib.states {
                    if !seen.insert(state.key().clone()) {
                        return Err(self.structure(
                            version,
                            StructureError::DuplicateState {
                                key: state.key().clone(),
                            },
                        ));
                    }
                    let state = self.resolve_state(state, version, &mut issues);
                    tree.put_state(state)
                        .map_err(|source| self.structure(version, source))?;
                }
                self.tree = tree;
            }
            MessageBody::StateReport { family, parts } => {
                self.check_not_stale(version)?;
                for state in parts.iter().flat_map(|part| part.states.iter()) {
                    self.apply_reported_state(state, Some(*family), version, &mut issues)?;
                }
                self.tree.set_mdib_version(version);
            }
            MessageBody::WaveformStream { states } => {
                self.check_not_stale(version)?;
                for state in states {
                    self.apply_reported_state(state, None, version, &mut issues)?;
                }
                self.tree.set_mdib_version(version);
            }
            MessageBody::DescriptionModificationReport { parts } => {
                self.check_not_stale(version)?;
                check_part_order(parts).map_err(|misordered| ReplayError::PartOrder {
                    sequence_id: self.tree.sequence_id().to_string(),
                    mdib_version: version,
                    part: misordered.part,
                    child: misordered.child,
                    parent: misordered.parent,
                })?;
                for part in parts {
                    self.apply_part(part, version, &mut issues)?;
                }
                self.tree.set_mdib_version(version);
            }
            MessageBody::Other { .. } => {}
        }
        Ok(issues)
    }

    fn structure(&self, mdib_version: Version, source: StructureError) -> ReplayError {
        ReplayError::Structure {
            sequence_id: self.tree.sequence_id().to_string(),
            mdib_version,
            source,
        }
    }

    fn check_not_stale(&self, version: Version) -> Result<(), ReplayError> {
        if version < self.tree.mdib_version() {
            return Err(ReplayError::StaleReport {
                sequence_id: self.tree.sequence_id().to_string(),
                report_version: version,
                current_version: self.tree.mdib_version(),
            });
        }
        Ok(())
    }

    fn observe(
        &mut self,
        handle: &str,
        kind: VersionKind,
        transmitted: Option<Version>,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> Version {
        let observation = self.ledger.observe(handle, kind, transmitted);
        if let Some(problem) = observation.problem {
            issues.push(VersionIssue {
                handle: handle.to_string(),
                kind,
                mdib_version,
                problem,
            });
        }
        observation.resolved
    }

    fn resolve_descriptor(
        &mut self,
        descriptor: &Descriptor,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> Descriptor {
        let mut flat = descriptor.without_children();
        let resolved = self.observe(
            &descriptor.handle,
            VersionKind::Descriptor,
            descriptor.descriptor_version,
            mdib_version,
            issues,
        );
        flat.descriptor_version = Some(resolved);
        flat
    }

    fn resolve_state(
        &mut self,
        state: &State,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> State {
        let key = state.key().clone();
        let mut resolved = state.clone();
        resolved.state_version = Some(self.observe(
            &key,
            VersionKind::State,
            state.state_version,
            mdib_version,
            issues,
        ));
        resolved.descriptor_version = Some(self.observe(
            &key,
            VersionKind::StateDescriptor,
            state.descriptor_version,
            mdib_version,
            issues,
        ));
        resolved
    }

    /// Inserts `root` and every descriptor nested in it.
    fn insert_nested(
        &mut self,
        tree: &mut StateTree,
        root: &Descriptor,
        parent: Option<&str>,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> Result<(), ReplayError> {
        for (nested_parent, descriptor) in root.flatten() {
            let parent = nested_parent.map(String::as_str).or(parent);
            let flat = self.resolve_descriptor(descriptor, mdib_version, issues);
            tree.insert(flat, parent)
                .map_err(|source| ReplayError::Structure {
                    sequence_id: tree.sequence_id().to_string(),
                    mdib_version,
                    source,
                })?;
        }
        Ok(())
    }

    fn apply_reported_state(
        &mut self,
        state: &State,
        report: Option<ReportFamily>,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> Result<(), ReplayError> {
        match report {
            Some(report) if !report.carries(state.family()) => {
                return Err(self.structure(
                    mdib_version,
                    StructureError::ReportFamilyMismatch {
                        handle: state.descriptor_handle.clone(),
                        report,
                    },
                ));
            }
            None if state.family() != StateFamily::Metric => {
                return Err(self.structure(
                    mdib_version,
                    StructureError::ReportFamilyMismatch {
                        handle: state.descriptor_handle.clone(),
                        report: ReportFamily::Metric,
                    },
                ));
            }
            _ => {}
        }
        let resolved = self.resolve_state(state, mdib_version, issues);
        self.tree
            .put_state(resolved)
            .map_err(|source| self.structure(mdib_version, source))?;
        Ok(())
    }

    fn apply_part(
        &mut self,
        part: &DescriptionModificationPart,
        mdib_version: Version,
        issues: &mut Vec<VersionIssue>,
    ) -> Result<(), ReplayError> {
        match part.modification() {
            DescriptionModificationType::Create => {
                let placeholder = StateTree::new(self.tree.sequence_id(), mdib_version);
                let mut tree = std::mem::replace(&mut self.tree, placeholder);
                let inserted = part.descriptors.iter().try_for_each(|descriptor| {
                    self.insert_nested(
                        &mut tree,
                        descriptor,
                        part.parent_descriptor.as_deref(),
                        mdib_version,
                        issues,
                    )
                });
                self.tree = tree;
                inserted?;
            }
            DescriptionModificationType::Update => {
                for descriptor in &part.descriptors {
                    let flat = self.resolve_descriptor(descriptor, mdib_version, issues);
                    self.tree
                        .update(flat)
                        .map_err(|source| self.structure(mdib_version, source))?;
                }
            }
            DescriptionModificationType::Delete => {
                for descriptor in &part.descriptors {
                    self.observe(
                        &descriptor.handle,
                        VersionKind::Descriptor,
                        descriptor.descriptor_version,
                        mdib_version,
                        issues,
                    );
                    self.tree
                        .remove(&descriptor.handle)
                        .map_err(|source| self.structure(mdib_version, source))?;
                }
                return Ok(());
            }
        }
        for state in &part.states {
            let resolved = self.resolve_state(state, mdib_version, issues);
            self.tree
                .put_state(resolved)
                .map_err(|source| self.structure(mdib_version, source))?;
        }
        Ok(())
    }
}

/// Checks that every part naming a parent descriptor comes after the part
/// that carries that parent.
pub fn check_part_order(parts: &[DescriptionModificationPart]) -> Result<(), MisorderedPart> {
    for (position, part) in parts.iter().enumerate() {
        let Some(parent) = part.parent_descriptor.as_ref() else {
            continue;
        };
        let parent_later = parts[position + 1..]
            .iter()
            .any(|later| later.descriptors.iter().any(|d| &d.handle == parent));
        if parent_later {
            return Err(MisorderedPart {
                part: position,
                child: part.descriptors.first().map(|d| d.handle.clone()),
                parent: parent.clone(),
            });
        }
    }
    Ok(())
}

/// Whether any part of the report names another part's descriptor as parent.
pub fn has_parent_child_parts(parts: &[DescriptionModificationPart]) -> bool {
    parts.iter().any(|part| {
        part.parent_descriptor.as_ref().is_some_and(|parent| {
            parts
                .iter()
                .any(|other| other.descriptors.iter().any(|d| &d.handle == parent))
        })
    })
}
