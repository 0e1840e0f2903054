//! Content comparison of descriptors and states.
//!
//! Both comparisons ignore version attributes. Descriptor comparison also
//! ignores nested child descriptors: child-set changes are judged separately.
//! State comparison treats an omitted attribute as its implied value, so a
//! state that stops transmitting `ActivationState="On"` has not changed.

use std::collections::BTreeSet;

use mdib_ir::{
    AlertSignalPresence, AlertSignalPrimaryLocation, ComponentActivation, ContextAssociation,
    Descriptor, Handle, State, StateBody,
};

use crate::tree::Entity;

/// Whether two descriptors carry the same content.
pub fn descriptor_content_eq(left: &Descriptor, right: &Descriptor) -> bool {
    left.handle == right.handle && left.body.without_children() == right.body.without_children()
}

/// Whether two states carry the same content.
pub fn state_content_eq(left: &State, right: &State) -> bool {
    left.descriptor_handle == right.descriptor_handle
        && left.handle == right.handle
        && with_implied_values(&left.body) == with_implied_values(&right.body)
}

/// The body with every omitted attribute that has an implied value filled in.
fn with_implied_values(body: &StateBody) -> StateBody {
    let mut body = body.clone();
    match &mut body {
        StateBody::Component {
            activation_state, ..
        }
        | StateBody::Metric {
            activation_state, ..
        } => {
            activation_state.get_or_insert(ComponentActivation::On);
        }
        StateBody::AlertCondition { presence, .. } => {
            presence.get_or_insert(false);
        }
        StateBody::AlertSignal {
            presence, location, ..
        } => {
            presence.get_or_insert(AlertSignalPresence::Off);
            location.get_or_insert(AlertSignalPrimaryLocation::Local);
        }
        StateBody::Context {
            context_association,
            ..
        } => {
            context_association.get_or_insert(ContextAssociation::NotAssociated);
        }
        StateBody::AlertSystem { .. } | StateBody::Operation { .. } => {}
    }
    body
}

/// Child handles of an entity, order-insensitive.
pub fn child_set(entity: &Entity) -> BTreeSet<&Handle> {
    entity.children.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdib_ir::fixtures::*;
    use mdib_ir::{AlertActivation, MetricCategory};

    #[test]
    fn versions_do_not_count_as_content() {
        let left = numeric_metric("m0", MetricCategory::Measurement).with_version(1);
        let right = numeric_metric("m0", MetricCategory::Measurement).with_version(7);
        assert!(descriptor_content_eq(&left, &right));

        let left = metric_state("m0", ComponentActivation::On).with_state_version(1);
        let right = metric_state("m0", ComponentActivation::On)
            .with_state_version(2)
            .with_descriptor_version(4);
        assert!(state_content_eq(&left, &right));
    }

    #[test]
    fn nested_children_do_not_count_as_content() {
        let bare = channel(CHANNEL);
        let nested = nest(
            channel(CHANNEL),
            vec![numeric_metric("m0", MetricCategory::Measurement)],
        );
        assert!(descriptor_content_eq(&bare, &nested));
    }

    #[test]
    fn own_attributes_count_as_content() {
        let plain = channel(CHANNEL);
        let coded = with_type_code(channel(CHANNEL), "MDC_DEV_CHAN");
        assert!(!descriptor_content_eq(&plain, &coded));

        let on = metric_state("m0", ComponentActivation::On);
        let off = metric_state("m0", ComponentActivation::Off);
        assert!(!state_content_eq(&on, &off));
    }

    #[test]
    fn omitted_attributes_equal_their_implied_values() {
        let explicit = metric_state("m0", ComponentActivation::On);
        let mut omitted = explicit.clone();
        if let StateBody::Metric {
            activation_state, ..
        } = &mut omitted.body
        {
            *activation_state = None;
        }
        assert!(state_content_eq(&explicit, &omitted));

        let mut standby = explicit.clone();
        if let StateBody::Metric {
            activation_state, ..
        } = &mut standby.body
        {
            *activation_state = Some(ComponentActivation::StandBy);
        }
        assert!(!state_content_eq(&standby, &omitted));

        let absent = alert_condition_state("ac0", AlertActivation::On, false);
        let mut unset = absent.clone();
        if let StateBody::AlertCondition { presence, .. } = &mut unset.body {
            *presence = None;
        }
        assert!(state_content_eq(&absent, &unset));

        let unassociated = context_state("pc0", "pc0.s0", ContextAssociation::NotAssociated);
        let mut silent = unassociated.clone();
        if let StateBody::Context {
            context_association,
            ..
        } = &mut silent.body
        {
            *context_association = None;
        }
        assert!(state_content_eq(&unassociated, &silent));
        let associated = context_state("pc0", "pc0.s0", ContextAssociation::Associated);
        assert!(!state_content_eq(&associated, &silent));
    }
}
