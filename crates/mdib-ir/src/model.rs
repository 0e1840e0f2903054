//! Element kinds and the enumerations shared by descriptors, states and
//! manipulations. Every enumeration round-trips through its BICEPS wire code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier of one element within a session.
pub type Handle = String;
/// Descriptor, state or mdib version number.
pub type Version = u64;
/// Nanoseconds since the start of the recording.
pub type Timestamp = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code '{code}'")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

/// Declares an enumeration that serializes to, displays as and parses from
/// its BICEPS wire code.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $code)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCode;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim() {
                    $( $code => Ok($name::$variant), )+
                    other => Err(UnknownCode { kind: $label, code: other.into() }),
                }
            }
        }
    };
}

coded_enum! {
    /// Activation of a device component or metric.
    ComponentActivation ("component activation") {
        On => "On",
        NotReady => "NotRdy",
        StandBy => "StndBy",
        Off => "Off",
        Shutdown => "Shtdn",
        Failure => "Fail",
    }
}

coded_enum! {
    /// Activation of an alert system, condition or signal.
    AlertActivation ("alert activation") {
        On => "On",
        Off => "Off",
        Paused => "Psd",
    }
}

coded_enum! {
    AlertSignalManifestation ("alert signal manifestation") {
        Audible => "Aud",
        Visible => "Vis",
        Tangible => "Tan",
        Other => "Oth",
    }
}

coded_enum! {
    AlertSignalPrimaryLocation ("alert signal location") {
        Local => "Loc",
        Remote => "Rem",
    }
}

coded_enum! {
    AlertSignalPresence ("alert signal presence") {
        On => "On",
        Off => "Off",
        Latched => "Latch",
        Acknowledged => "Ack",
    }
}

coded_enum! {
    AlertConditionKind ("alert condition kind") {
        Physiological => "Phy",
        Technical => "Tec",
        Other => "Oth",
    }
}

coded_enum! {
    AlertConditionPriority ("alert condition priority") {
        Low => "Lo",
        Medium => "Me",
        High => "Hi",
        Unprioritized => "None",
    }
}

coded_enum! {
    MetricCategory ("metric category") {
        Unspecified => "Unspec",
        Measurement => "Msrmt",
        Calculation => "Clc",
        Setting => "Set",
        Preset => "Preset",
        Recommendation => "Rcmm",
    }
}

coded_enum! {
    MetricAvailability ("metric availability") {
        Intermittent => "Intr",
        Continuous => "Cont",
    }
}

coded_enum! {
    ContextAssociation ("context association") {
        NotAssociated => "No",
        PreAssociated => "Pre",
        Associated => "Assoc",
        Disassociated => "Dis",
    }
}

coded_enum! {
    OperatingMode ("operating mode") {
        Enabled => "En",
        Disabled => "Dis",
        NotAvailable => "NA",
    }
}

coded_enum! {
    DescriptionModificationType ("modification type") {
        Create => "Crt",
        Update => "Upt",
        Delete => "Del",
    }
}

coded_enum! {
    ContextKind ("context kind") {
        Patient => "Patient",
        Location => "Location",
        Ensemble => "Ensemble",
        Operator => "Operator",
        Workflow => "Workflow",
        Means => "Means",
    }
}

coded_enum! {
    MetricKind ("metric kind") {
        Numeric => "Numeric",
        Text => "String",
        EnumString => "EnumString",
        RealTimeSampleArray => "RealTimeSampleArray",
        DistributionSampleArray => "DistributionSampleArray",
    }
}

coded_enum! {
    OperationKind ("operation kind") {
        SetString => "SetString",
        SetValue => "SetValue",
        Activate => "Activate",
        SetComponentState => "SetComponentState",
        SetContextState => "SetContextState",
        SetMetricState => "SetMetricState",
        SetAlertState => "SetAlertState",
    }
}

impl MetricKind {
    /// Sample-array metrics are the ones carried by waveform streams.
    pub fn is_sample_array(&self) -> bool {
        matches!(
            self,
            MetricKind::RealTimeSampleArray | MetricKind::DistributionSampleArray
        )
    }
}

/// The closed set of element kinds in the device-state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "variant", rename_all = "snake_case")]
pub enum ElementKind {
    Mds,
    Vmd,
    Channel,
    Battery,
    Clock,
    Sco,
    SystemContext,
    AlertSystem,
    AlertCondition,
    AlertSignal,
    Context(ContextKind),
    Metric(MetricKind),
    Operation(OperationKind),
}

/// Which state body a descriptor kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFamily {
    Component,
    AlertSystem,
    AlertCondition,
    AlertSignal,
    Context,
    Metric,
    Operation,
}

/// The five episodic state report families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFamily {
    Alert,
    Component,
    Context,
    Metric,
    Operational,
}

impl ReportFamily {
    pub const ALL: [ReportFamily; 5] = [
        ReportFamily::Alert,
        ReportFamily::Component,
        ReportFamily::Context,
        ReportFamily::Metric,
        ReportFamily::Operational,
    ];

    /// Name of the episodic report body, e.g. `EpisodicAlertReport`.
    pub fn report_name(&self) -> &'static str {
        match self {
            ReportFamily::Alert => "EpisodicAlertReport",
            ReportFamily::Component => "EpisodicComponentReport",
            ReportFamily::Context => "EpisodicContextReport",
            ReportFamily::Metric => "EpisodicMetricReport",
            ReportFamily::Operational => "EpisodicOperationalStateReport",
        }
    }

    pub fn carries(&self, family: StateFamily) -> bool {
        match self {
            ReportFamily::Alert => matches!(
                family,
                StateFamily::AlertSystem | StateFamily::AlertCondition | StateFamily::AlertSignal
            ),
            ReportFamily::Component => family == StateFamily::Component,
            ReportFamily::Context => family == StateFamily::Context,
            ReportFamily::Metric => family == StateFamily::Metric,
            ReportFamily::Operational => family == StateFamily::Operation,
        }
    }
}

impl fmt::Display for ReportFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report_name())
    }
}

impl ElementKind {
    pub fn state_family(&self) -> StateFamily {
        match self {
            ElementKind::Mds
            | ElementKind::Vmd
            | ElementKind::Channel
            | ElementKind::Battery
            | ElementKind::Clock
            | ElementKind::Sco
            | ElementKind::SystemContext => StateFamily::Component,
            ElementKind::AlertSystem => StateFamily::AlertSystem,
            ElementKind::AlertCondition => StateFamily::AlertCondition,
            ElementKind::AlertSignal => StateFamily::AlertSignal,
            ElementKind::Context(_) => StateFamily::Context,
            ElementKind::Metric(_) => StateFamily::Metric,
            ElementKind::Operation(_) => StateFamily::Operation,
        }
    }

    /// Device components carry an `AbstractDeviceComponentState`.
    pub fn is_component(&self) -> bool {
        self.state_family() == StateFamily::Component
    }

    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            ElementKind::AlertSystem | ElementKind::AlertCondition | ElementKind::AlertSignal
        )
    }

    pub fn is_context(&self) -> bool {
        matches!(self, ElementKind::Context(_))
    }

    /// Whether `child` may appear directly below an element of this kind.
    pub fn may_contain(&self, child: ElementKind) -> bool {
        match self {
            ElementKind::Mds => matches!(
                child,
                ElementKind::Vmd
                    | ElementKind::AlertSystem
                    | ElementKind::SystemContext
                    | ElementKind::Sco
                    | ElementKind::Clock
                    | ElementKind::Battery
            ),
            ElementKind::Vmd => matches!(
                child,
                ElementKind::Channel | ElementKind::AlertSystem | ElementKind::Sco
            ),
            ElementKind::Channel => matches!(child, ElementKind::Metric(_)),
            ElementKind::AlertSystem => {
                matches!(child, ElementKind::AlertCondition | ElementKind::AlertSignal)
            }
            ElementKind::Sco => matches!(child, ElementKind::Operation(_)),
            ElementKind::SystemContext => matches!(child, ElementKind::Context(_)),
            ElementKind::Battery
            | ElementKind::Clock
            | ElementKind::AlertCondition
            | ElementKind::AlertSignal
            | ElementKind::Context(_)
            | ElementKind::Metric(_)
            | ElementKind::Operation(_) => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Mds => f.write_str("Mds"),
            ElementKind::Vmd => f.write_str("Vmd"),
            ElementKind::Channel => f.write_str("Channel"),
            ElementKind::Battery => f.write_str("Battery"),
            ElementKind::Clock => f.write_str("Clock"),
            ElementKind::Sco => f.write_str("Sco"),
            ElementKind::SystemContext => f.write_str("SystemContext"),
            ElementKind::AlertSystem => f.write_str("AlertSystem"),
            ElementKind::AlertCondition => f.write_str("AlertCondition"),
            ElementKind::AlertSignal => f.write_str("AlertSignal"),
            ElementKind::Context(kind) => write!(f, "{kind}Context"),
            ElementKind::Metric(kind) => write!(f, "{kind}Metric"),
            ElementKind::Operation(kind) => write!(f, "{kind}Operation"),
        }
    }
}
