//! Builders for descriptors, states, messages and manipulations used by tests
//! across the workspace.
//!
//! Everything is created without versions; tests add the versions they care
//! about with `with_version`, `with_state_version` and friends.

use std::collections::BTreeMap;

use crate::descriptor::{Descriptor, DescriptorBody};
use crate::manipulation::*;
use crate::message::*;
use crate::model::*;
use crate::state::{MetricValue, State, StateBody, SystemSignalActivation};

pub const SEQUENCE_ID: &str = "urn:uuid:00000000-0000-0000-0000-000000000001";
pub const OTHER_SEQUENCE_ID: &str = "urn:uuid:00000000-0000-0000-0000-000000000002";

pub const MDS: &str = "mds0";
pub const VMD: &str = "vmd0";
pub const CHANNEL: &str = "ch0";
pub const ALERT_SYSTEM: &str = "asy.mds0";
pub const ALERT_CONDITION: &str = "ac0";
pub const AUDIBLE_SIGNAL: &str = "as.aud";
pub const VISIBLE_SIGNAL: &str = "as.vis";
pub const SCO: &str = "sco.mds0";
pub const SET_OPERATION: &str = "op.set";
pub const SYSTEM_CONTEXT: &str = "sc.mds0";
pub const PATIENT_CONTEXT: &str = "pc0";
pub const PATIENT_STATE: &str = "pc0.s0";
pub const LOCATION_CONTEXT: &str = "lc0";
pub const MEASUREMENT_METRIC: &str = "metric.msrmt";
pub const SETTING_METRIC: &str = "metric.set";
pub const WAVEFORM_METRIC: &str = "rtsa.msrmt";

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

pub fn mds(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Mds {
            type_code: None,
            vmds: vec![],
            alert_system: None,
            system_context: None,
            sco: None,
            clock: None,
            batteries: vec![],
        },
    )
}

pub fn vmd(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Vmd {
            type_code: None,
            channels: vec![],
            alert_system: None,
            sco: None,
        },
    )
}

pub fn channel(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Channel {
            type_code: None,
            metrics: vec![],
        },
    )
}

pub fn battery(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Battery {
            type_code: None,
            capacity_full_charge: None,
        },
    )
}

pub fn sco(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorBody::Sco { operations: vec![] })
}

pub fn system_context(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::SystemContext {
            patient_context: None,
            location_context: None,
            ensemble_contexts: vec![],
            operator_contexts: vec![],
            workflow_contexts: vec![],
            means_contexts: vec![],
        },
    )
}

pub fn patient_context(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Context {
            context_kind: ContextKind::Patient,
            type_code: None,
        },
    )
}

pub fn location_context(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Context {
            context_kind: ContextKind::Location,
            type_code: None,
        },
    )
}

pub fn alert_system(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::AlertSystem {
            self_check_period: None,
            max_physiological_parallel_alarms: None,
            alert_conditions: vec![],
            alert_signals: vec![],
        },
    )
}

pub fn alert_condition(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::AlertCondition {
            type_code: None,
            condition_kind: AlertConditionKind::Physiological,
            priority: AlertConditionPriority::Medium,
            sources: vec![],
        },
    )
}

pub fn alert_signal(handle: &str, manifestation: AlertSignalManifestation) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::AlertSignal {
            condition_signaled: None,
            manifestation,
            latching: false,
        },
    )
}

pub fn numeric_metric(handle: &str, category: MetricCategory) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Metric {
            metric_kind: MetricKind::Numeric,
            metric_category: category,
            metric_availability: None,
            unit: None,
            type_code: None,
        },
    )
}

pub fn sample_array_metric(handle: &str, category: MetricCategory) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Metric {
            metric_kind: MetricKind::RealTimeSampleArray,
            metric_category: category,
            metric_availability: Some(MetricAvailability::Continuous),
            unit: None,
            type_code: None,
        },
    )
}

pub fn set_value_operation(handle: &str, target: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorBody::Operation {
            operation_kind: OperationKind::SetValue,
            operation_target: target.into(),
        },
    )
}

/// Nests `children` into `parent`.
///
/// # Panics
///
/// When `parent` has no slot for one of the children.
pub fn nest(mut parent: Descriptor, children: Vec<Descriptor>) -> Descriptor {
    for child in children {
        if let Err(child) = parent.body.push_child(child) {
            panic!("{} cannot contain {}", parent.kind(), child.kind());
        }
    }
    parent
}

/// Overwrites a descriptor's `type_code` to produce a content change.
pub fn with_type_code(mut descriptor: Descriptor, code: &str) -> Descriptor {
    let kind = descriptor.kind();
    match &mut descriptor.body {
        DescriptorBody::Mds { type_code, .. }
        | DescriptorBody::Vmd { type_code, .. }
        | DescriptorBody::Channel { type_code, .. }
        | DescriptorBody::Battery { type_code, .. }
        | DescriptorBody::Clock { type_code, .. }
        | DescriptorBody::AlertCondition { type_code, .. }
        | DescriptorBody::Context { type_code, .. }
        | DescriptorBody::Metric { type_code, .. } => *type_code = Some(code.into()),
        DescriptorBody::AlertSystem {
            self_check_period, ..
        } => *self_check_period = code.parse().ok(),
        DescriptorBody::Sco { .. }
        | DescriptorBody::SystemContext { .. }
        | DescriptorBody::AlertSignal { .. }
        | DescriptorBody::Operation { .. } => {
            panic!("{kind} has no type code")
        }
    }
    descriptor
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

pub fn component_state(handle: &str, activation: ComponentActivation) -> State {
    State::new(
        handle,
        StateBody::Component {
            activation_state: Some(activation),
            operating_hours: None,
            calibration: None,
        },
    )
}

pub fn alert_system_state(handle: &str, activation: AlertActivation) -> State {
    State::new(
        handle,
        StateBody::AlertSystem {
            activation_state: activation,
            last_self_check: None,
            present_physiological_alarm_conditions: vec![],
            present_technical_alarm_conditions: vec![],
            system_signal_activations: vec![],
        },
    )
}

/// Alert system state declaring one system signal activation per entry.
pub fn alert_system_state_with_signals(
    handle: &str,
    activation: AlertActivation,
    signals: &[(AlertSignalManifestation, AlertActivation)],
) -> State {
    let mut state = alert_system_state(handle, activation);
    if let StateBody::AlertSystem {
        system_signal_activations,
        ..
    } = &mut state.body
    {
        *system_signal_activations = signals
            .iter()
            .map(|(manifestation, state)| SystemSignalActivation {
                manifestation: *manifestation,
                state: *state,
            })
            .collect();
    }
    state
}

pub fn alert_condition_state(handle: &str, activation: AlertActivation, presence: bool) -> State {
    State::new(
        handle,
        StateBody::AlertCondition {
            activation_state: activation,
            presence: Some(presence),
            actual_priority: None,
            determination_time: None,
        },
    )
}

pub fn alert_signal_state(handle: &str, activation: AlertActivation) -> State {
    State::new(
        handle,
        StateBody::AlertSignal {
            activation_state: activation,
            presence: None,
            location: None,
            slot: None,
        },
    )
}

pub fn remote_alert_signal_state(handle: &str, activation: AlertActivation) -> State {
    State::new(
        handle,
        StateBody::AlertSignal {
            activation_state: activation,
            presence: None,
            location: Some(AlertSignalPrimaryLocation::Remote),
            slot: None,
        },
    )
}

pub fn context_state(descriptor: &str, handle: &str, association: ContextAssociation) -> State {
    State::new(
        descriptor,
        StateBody::Context {
            context_association: Some(association),
            identification: vec![],
            binding_mdib_version: None,
        },
    )
    .with_handle(handle)
}

pub fn metric_state(handle: &str, activation: ComponentActivation) -> State {
    State::new(
        handle,
        StateBody::Metric {
            activation_state: Some(activation),
            metric_value: None,
        },
    )
}

pub fn metric_value_state(handle: &str, activation: ComponentActivation, value: &str) -> State {
    State::new(
        handle,
        StateBody::Metric {
            activation_state: Some(activation),
            metric_value: Some(MetricValue {
                value: Some(value.into()),
                samples: vec![],
                determination_time: None,
            }),
        },
    )
}

pub fn operation_state(handle: &str, mode: OperatingMode) -> State {
    State::new(
        handle,
        StateBody::Operation {
            operating_mode: mode,
        },
    )
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub fn inbound(timestamp: Timestamp, sequence_id: &str, version: Version, body: MessageBody) -> Message {
    Message {
        timestamp,
        direction: Direction::Inbound,
        sequence_id: sequence_id.into(),
        mdib_version: Some(version),
        body,
    }
}

pub fn baseline(
    timestamp: Timestamp,
    sequence_id: &str,
    version: Version,
    descriptors: Vec<Descriptor>,
    states: Vec<State>,
) -> Message {
    inbound(
        timestamp,
        sequence_id,
        version,
        MessageBody::GetMdibResponse {
            mdib: Mdib {
                descriptors,
                states,
            },
        },
    )
}

pub fn state_report(
    timestamp: Timestamp,
    sequence_id: &str,
    version: Version,
    family: ReportFamily,
    states: Vec<State>,
) -> Message {
    inbound(
        timestamp,
        sequence_id,
        version,
        MessageBody::StateReport {
            family,
            parts: vec![StateReportPart {
                source_mds: None,
                states,
            }],
        },
    )
}

pub fn description_modification(
    timestamp: Timestamp,
    sequence_id: &str,
    version: Version,
    parts: Vec<DescriptionModificationPart>,
) -> Message {
    inbound(
        timestamp,
        sequence_id,
        version,
        MessageBody::DescriptionModificationReport { parts },
    )
}

pub fn waveform(timestamp: Timestamp, sequence_id: &str, version: Version, states: Vec<State>) -> Message {
    inbound(
        timestamp,
        sequence_id,
        version,
        MessageBody::WaveformStream { states },
    )
}

pub fn part(
    modification: DescriptionModificationType,
    parent: Option<&str>,
    descriptors: Vec<Descriptor>,
    states: Vec<State>,
) -> DescriptionModificationPart {
    DescriptionModificationPart {
        modification_type: Some(modification),
        parent_descriptor: parent.map(Into::into),
        descriptors,
        states,
    }
}

pub fn set_metric_status(
    start: Timestamp,
    finish: Timestamp,
    result: ManipulationResult,
    handle: &str,
    category: MetricCategory,
    activation: ComponentActivation,
) -> ManipulationRecord {
    ManipulationRecord {
        name: MANIPULATION_SET_METRIC_STATUS.into(),
        start,
        finish,
        result,
        parameters: BTreeMap::from([
            (PARAMETER_HANDLE.to_string(), handle.to_string()),
            (PARAMETER_METRIC_CATEGORY.to_string(), category.as_str().to_string()),
            (
                PARAMETER_COMPONENT_ACTIVATION.to_string(),
                activation.as_str().to_string(),
            ),
        ]),
    }
}

// ---------------------------------------------------------------------------
// A small but complete device
// ---------------------------------------------------------------------------

/// One MDS with an alert system, an SCO, a system context and one VMD with a
/// single channel holding a measurement, a setting and a waveform metric.
pub fn standard_descriptors() -> Vec<Descriptor> {
    let alerts = nest(
        alert_system(ALERT_SYSTEM),
        vec![
            alert_condition(ALERT_CONDITION),
            alert_signal(AUDIBLE_SIGNAL, AlertSignalManifestation::Audible),
            alert_signal(VISIBLE_SIGNAL, AlertSignalManifestation::Visible),
        ],
    );
    let sco_descriptor = nest(
        sco(SCO),
        vec![set_value_operation(SET_OPERATION, SETTING_METRIC)],
    );
    let context = nest(
        system_context(SYSTEM_CONTEXT),
        vec![patient_context(PATIENT_CONTEXT)],
    );
    let channel_descriptor = nest(
        channel(CHANNEL),
        vec![
            numeric_metric(MEASUREMENT_METRIC, MetricCategory::Measurement),
            numeric_metric(SETTING_METRIC, MetricCategory::Setting),
            sample_array_metric(WAVEFORM_METRIC, MetricCategory::Measurement),
        ],
    );
    let vmd_descriptor = nest(vmd(VMD), vec![channel_descriptor]);
    vec![nest(
        mds(MDS),
        vec![alerts, sco_descriptor, context, vmd_descriptor],
    )]
}

pub fn standard_states() -> Vec<State> {
    vec![
        component_state(MDS, ComponentActivation::On),
        alert_system_state(ALERT_SYSTEM, AlertActivation::On),
        alert_condition_state(ALERT_CONDITION, AlertActivation::On, false),
        alert_signal_state(AUDIBLE_SIGNAL, AlertActivation::On),
        alert_signal_state(VISIBLE_SIGNAL, AlertActivation::On),
        component_state(SCO, ComponentActivation::On),
        operation_state(SET_OPERATION, OperatingMode::Enabled),
        component_state(SYSTEM_CONTEXT, ComponentActivation::On),
        context_state(PATIENT_CONTEXT, PATIENT_STATE, ContextAssociation::Associated),
        component_state(VMD, ComponentActivation::On),
        component_state(CHANNEL, ComponentActivation::On),
        metric_state(MEASUREMENT_METRIC, ComponentActivation::On),
        metric_state(SETTING_METRIC, ComponentActivation::On),
        metric_state(WAVEFORM_METRIC, ComponentActivation::On),
    ]
}

/// Baseline of the standard device, all versions implied.
pub fn standard_baseline(timestamp: Timestamp, sequence_id: &str, version: Version) -> Message {
    baseline(
        timestamp,
        sequence_id,
        version,
        standard_descriptors(),
        standard_states(),
    )
}
