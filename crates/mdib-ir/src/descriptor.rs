//! Descriptors: the structural half of an MDIB element.
//!
//! A descriptor received in a baseline nests its child descriptors inside
//! kind-specific slots (an MDS holds its VMDs, a channel holds its metrics).
//! Descriptors in description modification reports are expected to be flat.
//! [`DescriptorBody::nested_children`] and [`Descriptor::without_children`]
//! are the per-kind views used to flatten and compare them.

use serde::{Deserialize, Serialize};

use crate::model::*;

/// The structural half of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub handle: Handle,
    /// Absent means "implied": zero on first observation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_version: Option<Version>,
    #[serde(flatten)]
    pub body: DescriptorBody,
}

/// Kind-specific descriptor content, including nested child slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DescriptorBody {
    Mds {
        #[serde(default)]
        type_code: Option<String>,
        #[serde(default)]
        vmds: Vec<Descriptor>,
        #[serde(default)]
        alert_system: Option<Box<Descriptor>>,
        #[serde(default)]
        system_context: Option<Box<Descriptor>>,
        #[serde(default)]
        sco: Option<Box<Descriptor>>,
        #[serde(default)]
        clock: Option<Box<Descriptor>>,
        #[serde(default)]
        batteries: Vec<Descriptor>,
    },
    Vmd {
        #[serde(default)]
        type_code: Option<String>,
        #[serde(default)]
        channels: Vec<Descriptor>,
        #[serde(default)]
        alert_system: Option<Box<Descriptor>>,
        #[serde(default)]
        sco: Option<Box<Descriptor>>,
    },
    Channel {
        #[serde(default)]
        type_code: Option<String>,
        #[serde(default)]
        metrics: Vec<Descriptor>,
    },
    Battery {
        #[serde(default)]
        type_code: Option<String>,
        #[serde(default)]
        capacity_full_charge: Option<String>,
    },
    Clock {
        #[serde(default)]
        type_code: Option<String>,
        #[serde(default)]
        time_protocols: Vec<String>,
    },
    Sco {
        #[serde(default)]
        operations: Vec<Descriptor>,
    },
    SystemContext {
        #[serde(default)]
        patient_context: Option<Box<Descriptor>>,
        #[serde(default)]
        location_context: Option<Box<Descriptor>>,
        #[serde(default)]
        ensemble_contexts: Vec<Descriptor>,
        #[serde(default)]
        operator_contexts: Vec<Descriptor>,
        #[serde(default)]
        workflow_contexts: Vec<Descriptor>,
        #[serde(default)]
        means_contexts: Vec<Descriptor>,
    },
    AlertSystem {
        #[serde(default)]
        self_check_period: Option<u64>,
        #[serde(default)]
        max_physiological_parallel_alarms: Option<u32>,
        #[serde(default)]
        alert_conditions: Vec<Descriptor>,
        #[serde(default)]
        alert_signals: Vec<Descriptor>,
    },
    AlertCondition {
        #[serde(default)]
        type_code: Option<String>,
        condition_kind: AlertConditionKind,
        priority: AlertConditionPriority,
        #[serde(default)]
        sources: Vec<Handle>,
    },
    AlertSignal {
        #[serde(default)]
        condition_signaled: Option<Handle>,
        manifestation: AlertSignalManifestation,
        #[serde(default)]
        latching: bool,
    },
    Context {
        context_kind: ContextKind,
        #[serde(default)]
        type_code: Option<String>,
    },
    Metric {
        metric_kind: MetricKind,
        metric_category: MetricCategory,
        #[serde(default)]
        metric_availability: Option<MetricAvailability>,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        type_code: Option<String>,
    },
    Operation {
        operation_kind: OperationKind,
        operation_target: Handle,
    },
}

fn boxed(slot: &Option<Box<Descriptor>>) -> impl Iterator<Item = &Descriptor> {
    slot.iter().map(|child| child.as_ref())
}

impl DescriptorBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            DescriptorBody::Mds { .. } => ElementKind::Mds,
            DescriptorBody::Vmd { .. } => ElementKind::Vmd,
            DescriptorBody::Channel { .. } => ElementKind::Channel,
            DescriptorBody::Battery { .. } => ElementKind::Battery,
            DescriptorBody::Clock { .. } => ElementKind::Clock,
            DescriptorBody::Sco { .. } => ElementKind::Sco,
            DescriptorBody::SystemContext { .. } => ElementKind::SystemContext,
            DescriptorBody::AlertSystem { .. } => ElementKind::AlertSystem,
            DescriptorBody::AlertCondition { .. } => ElementKind::AlertCondition,
            DescriptorBody::AlertSignal { .. } => ElementKind::AlertSignal,
            DescriptorBody::Context { context_kind, .. } => ElementKind::Context(*context_kind),
            DescriptorBody::Metric { metric_kind, .. } => ElementKind::Metric(*metric_kind),
            DescriptorBody::Operation { operation_kind, .. } => {
                ElementKind::Operation(*operation_kind)
            }
        }
    }

    /// Child descriptors embedded in this descriptor, in document order.
    pub fn nested_children(&self) -> Vec<&Descriptor> {
        match self {
            DescriptorBody::Mds {
                vmds,
                alert_system,
                system_context,
                sco,
                clock,
                batteries,
                ..
            } => boxed(alert_system)
                .chain(boxed(sco))
                .chain(boxed(system_context))
                .chain(boxed(clock))
                .chain(batteries.iter())
                .chain(vmds.iter())
                .collect(),
            DescriptorBody::Vmd {
                channels,
                alert_system,
                sco,
                ..
            } => boxed(alert_system)
                .chain(boxed(sco))
                .chain(channels.iter())
                .collect(),
            DescriptorBody::Channel { metrics, .. } => metrics.iter().collect(),
            DescriptorBody::Sco { operations } => operations.iter().collect(),
            DescriptorBody::SystemContext {
                patient_context,
                location_context,
                ensemble_contexts,
                operator_contexts,
                workflow_contexts,
                means_contexts,
            } => boxed(patient_context)
                .chain(boxed(location_context))
                .chain(ensemble_contexts.iter())
                .chain(operator_contexts.iter())
                .chain(workflow_contexts.iter())
                .chain(means_contexts.iter())
                .collect(),
            DescriptorBody::AlertSystem {
                alert_conditions,
                alert_signals,
                ..
            } => alert_conditions.iter().chain(alert_signals.iter()).collect(),
            DescriptorBody::Battery { .. }
            | DescriptorBody::Clock { .. }
            | DescriptorBody::AlertCondition { .. }
            | DescriptorBody::AlertSignal { .. }
            | DescriptorBody::Context { .. }
            | DescriptorBody::Metric { .. }
            | DescriptorBody::Operation { .. } => Vec::new(),
        }
    }

    /// A copy of this body with every nested child slot emptied.
    pub fn without_children(&self) -> DescriptorBody {
        match self {
            DescriptorBody::Mds { type_code, .. } => DescriptorBody::Mds {
                type_code: type_code.clone(),
                vmds: Vec::new(),
                alert_system: None,
                system_context: None,
                sco: None,
                clock: None,
                batteries: Vec::new(),
            },
            DescriptorBody::Vmd { type_code, .. } => DescriptorBody::Vmd {
                type_code: type_code.clone(),
                channels: Vec::new(),
                alert_system: None,
                sco: None,
            },
            DescriptorBody::Channel { type_code, .. } => DescriptorBody::Channel {
                type_code: type_code.clone(),
                metrics: Vec::new(),
            },
            DescriptorBody::Sco { .. } => DescriptorBody::Sco {
                operations: Vec::new(),
            },
            DescriptorBody::SystemContext { .. } => DescriptorBody::SystemContext {
                patient_context: None,
                location_context: None,
                ensemble_contexts: Vec::new(),
                operator_contexts: Vec::new(),
                workflow_contexts: Vec::new(),
                means_contexts: Vec::new(),
            },
            DescriptorBody::AlertSystem {
                self_check_period,
                max_physiological_parallel_alarms,
                ..
            } => DescriptorBody::AlertSystem {
                self_check_period: *self_check_period,
                max_physiological_parallel_alarms: *max_physiological_parallel_alarms,
                alert_conditions: Vec::new(),
                alert_signals: Vec::new(),
            },
            leaf @ (DescriptorBody::Battery { .. }
            | DescriptorBody::Clock { .. }
            | DescriptorBody::AlertCondition { .. }
            | DescriptorBody::AlertSignal { .. }
            | DescriptorBody::Context { .. }
            | DescriptorBody::Metric { .. }
            | DescriptorBody::Operation { .. }) => leaf.clone(),
        }
    }

    /// Places `child` into the slot this kind reserves for it.
    ///
    /// Returns the child back when this kind has no slot for it, or when the
    /// slot is single-valued and already taken.
    pub fn push_child(&mut self, child: Descriptor) -> Result<(), Descriptor> {
        fn fill(slot: &mut Option<Box<Descriptor>>, child: Descriptor) -> Result<(), Descriptor> {
            if slot.is_some() {
                return Err(child);
            }
            *slot = Some(Box::new(child));
            Ok(())
        }

        let kind = child.kind();
        match (self, kind) {
            (DescriptorBody::Mds { vmds, .. }, ElementKind::Vmd) => vmds.push(child),
            (DescriptorBody::Mds { batteries, .. }, ElementKind::Battery) => batteries.push(child),
            (DescriptorBody::Mds { alert_system, .. }, ElementKind::AlertSystem)
            | (DescriptorBody::Vmd { alert_system, .. }, ElementKind::AlertSystem) => {
                return fill(alert_system, child)
            }
            (DescriptorBody::Mds { sco, .. }, ElementKind::Sco)
            | (DescriptorBody::Vmd { sco, .. }, ElementKind::Sco) => return fill(sco, child),
            (DescriptorBody::Mds { system_context, .. }, ElementKind::SystemContext) => {
                return fill(system_context, child)
            }
            (DescriptorBody::Mds { clock, .. }, ElementKind::Clock) => return fill(clock, child),
            (DescriptorBody::Vmd { channels, .. }, ElementKind::Channel) => channels.push(child),
            (DescriptorBody::Channel { metrics, .. }, ElementKind::Metric(_)) => {
                metrics.push(child)
            }
            (DescriptorBody::Sco { operations }, ElementKind::Operation(_)) => {
                operations.push(child)
            }
            (DescriptorBody::AlertSystem { alert_conditions, .. }, ElementKind::AlertCondition) => {
                alert_conditions.push(child)
            }
            (DescriptorBody::AlertSystem { alert_signals, .. }, ElementKind::AlertSignal) => {
                alert_signals.push(child)
            }
            (DescriptorBody::SystemContext { patient_context, .. }, ElementKind::Context(ContextKind::Patient)) => {
                return fill(patient_context, child)
            }
            (DescriptorBody::SystemContext { location_context, .. }, ElementKind::Context(ContextKind::Location)) => {
                return fill(location_context, child)
            }
            (DescriptorBody::SystemContext { ensemble_contexts, .. }, ElementKind::Context(ContextKind::Ensemble)) => {
                ensemble_contexts.push(child)
            }
            (DescriptorBody::SystemContext { operator_contexts, .. }, ElementKind::Context(ContextKind::Operator)) => {
                operator_contexts.push(child)
            }
            (DescriptorBody::SystemContext { workflow_contexts, .. }, ElementKind::Context(ContextKind::Workflow)) => {
                workflow_contexts.push(child)
            }
            (DescriptorBody::SystemContext { means_contexts, .. }, ElementKind::Context(ContextKind::Means)) => {
                means_contexts.push(child)
            }
            _ => return Err(child),
        }
        Ok(())
    }
}

impl Descriptor {
    pub fn new(handle: impl Into<Handle>, body: DescriptorBody) -> Self {
        Self {
            handle: handle.into(),
            descriptor_version: None,
            body,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.descriptor_version = Some(version);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    pub fn nested_children(&self) -> Vec<&Descriptor> {
        self.body.nested_children()
    }

    pub fn has_nested_children(&self) -> bool {
        !self.body.nested_children().is_empty()
    }

    pub fn without_children(&self) -> Descriptor {
        Descriptor {
            handle: self.handle.clone(),
            descriptor_version: self.descriptor_version,
            body: self.body.without_children(),
        }
    }

    /// This descriptor followed by all nested descendants, depth first.
    /// Each entry carries the handle of the descriptor it was nested in.
    pub fn flatten(&self) -> Vec<(Option<&Handle>, &Descriptor)> {
        let mut out = Vec::new();
        let mut stack = vec![(None, self)];
        while let Some((parent, descriptor)) = stack.pop() {
            out.push((parent, descriptor));
            let children = descriptor.nested_children();
            for child in children.into_iter().rev() {
                stack.push((Some(&descriptor.handle), child));
            }
        }
        out
    }

    /// The handle of the operation target for operation descriptors.
    pub fn operation_target(&self) -> Option<&Handle> {
        match &self.body {
            DescriptorBody::Operation {
                operation_target, ..
            } => Some(operation_target),
            _ => None,
        }
    }

    pub fn metric_category(&self) -> Option<MetricCategory> {
        match &self.body {
            DescriptorBody::Metric {
                metric_category, ..
            } => Some(*metric_category),
            _ => None,
        }
    }

    pub fn manifestation(&self) -> Option<AlertSignalManifestation> {
        match &self.body {
            DescriptorBody::AlertSignal { manifestation, .. } => Some(*manifestation),
            _ => None,
        }
    }
}
