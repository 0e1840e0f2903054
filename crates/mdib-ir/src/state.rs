//! States: the mutable runtime half of an MDIB element.

use serde::{Deserialize, Serialize};

use crate::model::*;

/// The runtime half of an element.
///
/// Context states are multi-states: several states with distinct `handle`s may
/// belong to one context descriptor. Every other state is keyed by its
/// `descriptor_handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub descriptor_handle: Handle,
    /// Multi-state handle, only meaningful for context states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_version: Option<Version>,
    /// Version of the descriptor this state was produced for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_version: Option<Version>,
    #[serde(flatten)]
    pub body: StateBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSignalActivation {
    pub manifestation: AlertSignalManifestation,
    pub state: AlertActivation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub samples: Vec<f64>,
    #[serde(default)]
    pub determination_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateBody {
    Component {
        #[serde(default)]
        activation_state: Option<ComponentActivation>,
        #[serde(default)]
        operating_hours: Option<u32>,
        #[serde(default)]
        calibration: Option<String>,
    },
    AlertSystem {
        activation_state: AlertActivation,
        #[serde(default)]
        last_self_check: Option<Timestamp>,
        #[serde(default)]
        present_physiological_alarm_conditions: Vec<Handle>,
        #[serde(default)]
        present_technical_alarm_conditions: Vec<Handle>,
        #[serde(default)]
        system_signal_activations: Vec<SystemSignalActivation>,
    },
    AlertCondition {
        activation_state: AlertActivation,
        #[serde(default)]
        presence: Option<bool>,
        #[serde(default)]
        actual_priority: Option<AlertConditionPriority>,
        #[serde(default)]
        determination_time: Option<Timestamp>,
    },
    AlertSignal {
        activation_state: AlertActivation,
        #[serde(default)]
        presence: Option<AlertSignalPresence>,
        #[serde(default)]
        location: Option<AlertSignalPrimaryLocation>,
        #[serde(default)]
        slot: Option<u32>,
    },
    Context {
        #[serde(default)]
        context_association: Option<ContextAssociation>,
        #[serde(default)]
        identification: Vec<String>,
        #[serde(default)]
        binding_mdib_version: Option<Version>,
    },
    Metric {
        #[serde(default)]
        activation_state: Option<ComponentActivation>,
        #[serde(default)]
        metric_value: Option<MetricValue>,
    },
    Operation {
        operating_mode: OperatingMode,
    },
}

impl StateBody {
    pub fn family(&self) -> StateFamily {
        match self {
            StateBody::Component { .. } => StateFamily::Component,
            StateBody::AlertSystem { .. } => StateFamily::AlertSystem,
            StateBody::AlertCondition { .. } => StateFamily::AlertCondition,
            StateBody::AlertSignal { .. } => StateFamily::AlertSignal,
            StateBody::Context { .. } => StateFamily::Context,
            StateBody::Metric { .. } => StateFamily::Metric,
            StateBody::Operation { .. } => StateFamily::Operation,
        }
    }
}

impl State {
    pub fn new(descriptor_handle: impl Into<Handle>, body: StateBody) -> Self {
        Self {
            descriptor_handle: descriptor_handle.into(),
            handle: None,
            state_version: None,
            descriptor_version: None,
            body,
        }
    }

    pub fn with_state_version(mut self, version: Version) -> Self {
        self.state_version = Some(version);
        self
    }

    pub fn with_descriptor_version(mut self, version: Version) -> Self {
        self.descriptor_version = Some(version);
        self
    }

    pub fn with_handle(mut self, handle: impl Into<Handle>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn family(&self) -> StateFamily {
        self.body.family()
    }

    /// The key state versions are tracked under: the multi-state handle when
    /// present, otherwise the descriptor handle.
    pub fn key(&self) -> &Handle {
        self.handle.as_ref().unwrap_or(&self.descriptor_handle)
    }

    /// Component or metric activation, `On` when not transmitted.
    pub fn component_activation(&self) -> Option<ComponentActivation> {
        match &self.body {
            StateBody::Component {
                activation_state, ..
            }
            | StateBody::Metric {
                activation_state, ..
            } => Some(activation_state.unwrap_or(ComponentActivation::On)),
            _ => None,
        }
    }

    pub fn alert_activation(&self) -> Option<AlertActivation> {
        match &self.body {
            StateBody::AlertSystem {
                activation_state, ..
            }
            | StateBody::AlertCondition {
                activation_state, ..
            }
            | StateBody::AlertSignal {
                activation_state, ..
            } => Some(*activation_state),
            _ => None,
        }
    }

    /// Alert condition presence, `false` when not transmitted.
    pub fn presence(&self) -> bool {
        matches!(
            &self.body,
            StateBody::AlertCondition {
                presence: Some(true),
                ..
            }
        )
    }

    /// Alert signal location, `Loc` when not transmitted.
    pub fn signal_location(&self) -> Option<AlertSignalPrimaryLocation> {
        match &self.body {
            StateBody::AlertSignal { location, .. } => {
                Some(location.unwrap_or(AlertSignalPrimaryLocation::Local))
            }
            _ => None,
        }
    }

    /// Context association, `No` when not transmitted.
    pub fn context_association(&self) -> Option<ContextAssociation> {
        match &self.body {
            StateBody::Context {
                context_association,
                ..
            } => Some(context_association.unwrap_or(ContextAssociation::NotAssociated)),
            _ => None,
        }
    }

    pub fn operating_mode(&self) -> Option<OperatingMode> {
        match &self.body {
            StateBody::Operation { operating_mode } => Some(*operating_mode),
            _ => None,
        }
    }

    pub fn system_signal_activations(&self) -> &[SystemSignalActivation] {
        match &self.body {
            StateBody::AlertSystem {
                system_signal_activations,
                ..
            } => system_signal_activations,
            _ => &[],
        }
    }
}
