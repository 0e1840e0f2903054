//! The device-state tree of one session.
//!
//! Entities are stored flat, keyed by descriptor handle, with parent and child
//! links kept as handles. Descriptors are stored without nested children and
//! with their versions already resolved by the replayer.

use std::collections::HashMap;

use indexmap::IndexMap;
use mdib_ir::{Descriptor, ElementKind, Handle, ReportFamily, State, StateFamily, Version};
use thiserror::Error;

/// Structural violations detected while mutating a [`StateTree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("descriptor handle '{handle}' is already present")]
    DuplicateHandle { handle: Handle },
    #[error("descriptor '{handle}' refers to unknown parent '{parent}'")]
    UnknownParent { handle: Handle, parent: Handle },
    #[error("descriptor '{handle}' of kind {kind} needs a parent descriptor")]
    MissingParent { handle: Handle, kind: ElementKind },
    #[error("a {parent_kind} ('{parent}') cannot contain a {kind} ('{handle}')")]
    InvalidContainment {
        handle: Handle,
        kind: ElementKind,
        parent: Handle,
        parent_kind: ElementKind,
    },
    #[error("unknown descriptor handle '{handle}'")]
    UnknownHandle { handle: Handle },
    #[error("descriptor '{handle}' changed kind from {from} to {to}")]
    KindChanged {
        handle: Handle,
        from: ElementKind,
        to: ElementKind,
    },
    #[error("state for '{handle}' has the wrong shape for a {kind} descriptor")]
    StateKindMismatch { handle: Handle, kind: ElementKind },
    #[error("state for '{handle}' cannot be carried by an {report}")]
    ReportFamilyMismatch { handle: Handle, report: ReportFamily },
    #[error("state key '{key}' appears more than once")]
    DuplicateState { key: Handle },
}

/// One element of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub descriptor: Descriptor,
    pub parent: Option<Handle>,
    pub children: Vec<Handle>,
    /// One state, or any number for context descriptors.
    pub states: Vec<State>,
}

impl Entity {
    pub fn handle(&self) -> &Handle {
        &self.descriptor.handle
    }

    pub fn kind(&self) -> ElementKind {
        self.descriptor.kind()
    }

    /// Resolved descriptor version.
    pub fn descriptor_version(&self) -> Version {
        self.descriptor.descriptor_version.unwrap_or(0)
    }

    /// The single state of a non-context element.
    pub fn state(&self) -> Option<&State> {
        self.states.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateTree {
    sequence_id: String,
    mdib_version: Version,
    entities: IndexMap<Handle, Entity>,
    /// Multi-state key -> owning descriptor handle.
    state_owners: HashMap<Handle, Handle>,
}

impl StateTree {
    pub fn new(sequence_id: impl Into<String>, mdib_version: Version) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            mdib_version,
            entities: IndexMap::new(),
            state_owners: HashMap::new(),
        }
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn mdib_version(&self) -> Version {
        self.mdib_version
    }

    pub fn set_mdib_version(&mut self, version: Version) {
        self.mdib_version = version;
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.entities.contains_key(handle)
    }

    pub fn entity(&self, handle: &str) -> Option<&Entity> {
        self.entities.get(handle)
    }

    pub fn descriptor(&self, handle: &str) -> Option<&Descriptor> {
        self.entity(handle).map(|entity| &entity.descriptor)
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Every state in the tree, grouped by entity.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.entities.values().flat_map(|entity| entity.states.iter())
    }

    /// Looks a state up by its key (multi-state handle or descriptor handle).
    pub fn state(&self, key: &str) -> Option<&State> {
        let owner = self
            .state_owners
            .get(key)
            .map(String::as_str)
            .unwrap_or(key);
        self.entities
            .get(owner)?
            .states
            .iter()
            .find(|state| state.key() == key)
    }

    pub fn parent(&self, handle: &str) -> Option<&Entity> {
        let parent = self.entities.get(handle)?.parent.as_deref()?;
        self.entities.get(parent)
    }

    pub fn children(&self, handle: &str) -> Vec<&Entity> {
        self.entities
            .get(handle)
            .map(|entity| {
                entity
                    .children
                    .iter()
                    .filter_map(|child| self.entities.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ancestors of `handle`, nearest first.
    pub fn ancestors(&self, handle: &str) -> Vec<&Entity> {
        let mut out = Vec::new();
        let mut current = self.parent(handle);
        while let Some(entity) = current {
            out.push(entity);
            current = self.parent(entity.handle());
        }
        out
    }

    /// Descendants of `handle` (excluding itself), depth first.
    pub fn descendants(&self, handle: &str) -> Vec<&Entity> {
        let mut out = Vec::new();
        let mut stack: Vec<&Entity> = self.children(handle).into_iter().rev().collect();
        while let Some(entity) = stack.pop() {
            out.push(entity);
            stack.extend(self.children(entity.handle()).into_iter().rev());
        }
        out
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Inserts a childless descriptor below `parent`. Only MDS may be roots.
    pub fn insert(
        &mut self,
        descriptor: Descriptor,
        parent: Option<&str>,
    ) -> Result<(), StructureError> {
        let handle = descriptor.handle.clone();
        let kind = descriptor.kind();
        if self.entities.contains_key(&handle) {
            return Err(StructureError::DuplicateHandle { handle });
        }
        match parent {
            None if kind != ElementKind::Mds => {
                return Err(StructureError::MissingParent { handle, kind });
            }
            None => {}
            Some(parent) => {
                let parent_entity =
                    self.entities
                        .get_mut(parent)
                        .ok_or_else(|| StructureError::UnknownParent {
                            handle: handle.clone(),
                            parent: parent.to_string(),
                        })?;
                let parent_kind = parent_entity.kind();
                if !parent_kind.may_contain(kind) {
                    return Err(StructureError::InvalidContainment {
                        handle,
                        kind,
                        parent: parent.to_string(),
                        parent_kind,
                    });
                }
                parent_entity.children.push(handle.clone());
            }
        }
        self.entities.insert(
            handle,
            Entity {
                descriptor,
                parent: parent.map(str::to_string),
                children: Vec::new(),
                states: Vec::new(),
            },
        );
        Ok(())
    }

    /// Replaces the descriptor content of an existing element, keeping its
    /// links and states.
    pub fn update(&mut self, descriptor: Descriptor) -> Result<(), StructureError> {
        let entity = self.entities.get_mut(&descriptor.handle).ok_or_else(|| {
            StructureError::UnknownHandle {
                handle: descriptor.handle.clone(),
            }
        })?;
        let (from, to) = (entity.kind(), descriptor.kind());
        if from != to {
            return Err(StructureError::KindChanged {
                handle: descriptor.handle,
                from,
                to,
            });
        }
        entity.descriptor = descriptor;
        Ok(())
    }

    /// Removes `handle` and its whole subtree, returning the removed entities.
    pub fn remove(&mut self, handle: &str) -> Result<Vec<Entity>, StructureError> {
        if !self.entities.contains_key(handle) {
            return Err(StructureError::UnknownHandle {
                handle: handle.to_string(),
            });
        }
        let mut doomed: Vec<Handle> = vec![handle.to_string()];
        doomed.extend(
            self.descendants(handle)
                .into_iter()
                .map(|entity| entity.handle().clone()),
        );

        if let Some(parent) = self.entities[handle].parent.clone() {
            if let Some(parent) = self.entities.get_mut(&parent) {
                parent.children.retain(|child| child != handle);
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for handle in doomed {
            if let Some(entity) = self.entities.shift_remove(&handle) {
                for state in &entity.states {
                    self.state_owners.remove(state.key());
                }
                removed.push(entity);
            }
        }
        Ok(removed)
    }

    /// Stores `state`, replacing the state with the same key. Returns the
    /// replaced state.
    pub fn put_state(&mut self, state: State) -> Result<Option<State>, StructureError> {
        let entity = self.entities.get_mut(&state.descriptor_handle).ok_or_else(|| {
            StructureError::UnknownHandle {
                handle: state.descriptor_handle.clone(),
            }
        })?;
        let kind = entity.kind();
        if kind.state_family() != state.family() {
            return Err(StructureError::StateKindMismatch {
                handle: state.descriptor_handle.clone(),
                kind,
            });
        }

        if state.family() != StateFamily::Context {
            let previous = entity.states.pop();
            entity.states.clear();
            entity.states.push(state);
            return Ok(previous);
        }

        let key = state.key().clone();
        if key != state.descriptor_handle {
            self.state_owners
                .insert(key.clone(), state.descriptor_handle.clone());
        }
        match entity.states.iter_mut().find(|existing| *existing.key() == key) {
            Some(existing) => Ok(Some(std::mem::replace(existing, state))),
            None => {
                entity.states.push(state);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdib_ir::fixtures::*;
    use mdib_ir::{AlertActivation, ComponentActivation, ContextAssociation, MetricCategory};

    fn small_tree() -> StateTree {
        let mut tree = StateTree::new(SEQUENCE_ID, 1);
        tree.insert(mds(MDS), None).unwrap();
        tree.insert(vmd(VMD), Some(MDS)).unwrap();
        tree.insert(channel(CHANNEL), Some(VMD)).unwrap();
        tree.insert(
            numeric_metric(MEASUREMENT_METRIC, MetricCategory::Measurement),
            Some(CHANNEL),
        )
        .unwrap();
        tree.insert(system_context(SYSTEM_CONTEXT), Some(MDS)).unwrap();
        tree.insert(patient_context(PATIENT_CONTEXT), Some(SYSTEM_CONTEXT))
            .unwrap();
        tree
    }

    #[test]
    fn links_are_navigable_both_ways() {
        let tree = small_tree();
        let ancestors: Vec<_> = tree
            .ancestors(MEASUREMENT_METRIC)
            .into_iter()
            .map(|e| e.handle().as_str())
            .collect();
        assert_eq!(ancestors, vec![CHANNEL, VMD, MDS]);

        let descendants: Vec<_> = tree
            .descendants(MDS)
            .into_iter()
            .map(|e| e.handle().as_str())
            .collect();
        assert_eq!(
            descendants,
            vec![VMD, CHANNEL, MEASUREMENT_METRIC, SYSTEM_CONTEXT, PATIENT_CONTEXT]
        );
    }

    #[test]
    fn rejects_duplicate_handles() {
        let mut tree = small_tree();
        let err = tree.insert(vmd(VMD), Some(MDS)).unwrap_err();
        assert!(matches!(err, StructureError::DuplicateHandle { ref handle } if handle == VMD));
    }

    #[test]
    fn rejects_unknown_parent_and_bad_containment() {
        let mut tree = small_tree();
        match tree.insert(channel("ch1"), Some("nowhere")).unwrap_err() {
            StructureError::UnknownParent { parent, .. } => assert_eq!(parent, "nowhere"),
            other => panic!("expected UnknownParent, got: {other}"),
        }
        match tree.insert(channel("ch1"), Some(MDS)).unwrap_err() {
            StructureError::InvalidContainment { parent_kind, .. } => {
                assert_eq!(parent_kind, ElementKind::Mds)
            }
            other => panic!("expected InvalidContainment, got: {other}"),
        }
        match tree.insert(vmd("vmd1"), None).unwrap_err() {
            StructureError::MissingParent { kind, .. } => assert_eq!(kind, ElementKind::Vmd),
            other => panic!("expected MissingParent, got: {other}"),
        }
    }

    #[test]
    fn remove_drops_subtree_and_states() {
        let mut tree = small_tree();
        tree.put_state(metric_state(MEASUREMENT_METRIC, ComponentActivation::On))
            .unwrap();
        let removed = tree.remove(VMD).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!tree.contains(MEASUREMENT_METRIC));
        assert!(tree.state(MEASUREMENT_METRIC).is_none());
        assert!(tree.children(MDS).iter().all(|e| e.handle() != VMD));
    }

    #[test]
    fn context_descriptors_hold_many_states() {
        let mut tree = small_tree();
        tree.put_state(context_state(
            PATIENT_CONTEXT,
            "pc0.a",
            ContextAssociation::Associated,
        ))
        .unwrap();
        tree.put_state(context_state(
            PATIENT_CONTEXT,
            "pc0.b",
            ContextAssociation::NotAssociated,
        ))
        .unwrap();
        assert_eq!(tree.entity(PATIENT_CONTEXT).unwrap().states.len(), 2);
        assert_eq!(
            tree.state("pc0.b").and_then(State::context_association),
            Some(ContextAssociation::NotAssociated)
        );

        let replaced = tree
            .put_state(context_state(
                PATIENT_CONTEXT,
                "pc0.b",
                ContextAssociation::Associated,
            ))
            .unwrap();
        assert!(replaced.is_some());
        assert_eq!(tree.entity(PATIENT_CONTEXT).unwrap().states.len(), 2);
    }

    #[test]
    fn state_shape_must_match_descriptor_kind() {
        let mut tree = small_tree();
        let err = tree
            .put_state(alert_signal_state(MEASUREMENT_METRIC, AlertActivation::On))
            .unwrap_err();
        assert!(matches!(err, StructureError::StateKindMismatch { .. }));
    }

    #[test]
    fn update_refuses_kind_change() {
        let mut tree = small_tree();
        let mut replacement = channel(MEASUREMENT_METRIC);
        replacement.descriptor_version = Some(1);
        match tree.update(replacement).unwrap_err() {
            StructureError::KindChanged { to, .. } => assert_eq!(to, ElementKind::Channel),
            other => panic!("expected KindChanged, got: {other}"),
        }
    }
}
