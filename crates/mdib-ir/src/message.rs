//! Recorded protocol messages.

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::model::*;
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the device under test.
    Inbound,
    /// Sent by the test harness.
    Outbound,
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Arrival time in nanoseconds.
    pub timestamp: Timestamp,
    pub direction: Direction,
    /// Sequence identifier of the MDIB the message belongs to.
    pub sequence_id: String,
    /// Absent means "implied" (zero).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdib_version: Option<Version>,
    pub body: MessageBody,
}

/// A complete MDIB as returned by `GetMdib`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mdib {
    /// Root MDS descriptors with their nested children.
    #[serde(default)]
    pub descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub states: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReportPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mds: Option<Handle>,
    pub states: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionModificationPart {
    /// Absent means `Upt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_type: Option<DescriptionModificationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_descriptor: Option<Handle>,
    #[serde(default)]
    pub descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub states: Vec<State>,
}

impl DescriptionModificationPart {
    pub fn modification(&self) -> DescriptionModificationType {
        self.modification_type
            .unwrap_or(DescriptionModificationType::Update)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    /// Baseline snapshot.
    GetMdibResponse { mdib: Mdib },
    /// One of the five episodic state report families.
    StateReport {
        family: ReportFamily,
        parts: Vec<StateReportPart>,
    },
    DescriptionModificationReport {
        parts: Vec<DescriptionModificationPart>,
    },
    WaveformStream { states: Vec<State> },
    /// Traffic that does not change the MDIB (requests, subscriptions, ...).
    Other { action: String },
}

impl MessageBody {
    pub fn name(&self) -> &str {
        match self {
            MessageBody::GetMdibResponse { .. } => "GetMdibResponse",
            MessageBody::StateReport { family, .. } => family.report_name(),
            MessageBody::DescriptionModificationReport { .. } => "DescriptionModificationReport",
            MessageBody::WaveformStream { .. } => "WaveformStream",
            MessageBody::Other { action } => action,
        }
    }
}

impl Message {
    /// The mdib version, zero when not transmitted.
    pub fn version(&self) -> Version {
        self.mdib_version.unwrap_or(0)
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self.body, MessageBody::GetMdibResponse { .. })
    }

    pub fn report_family(&self) -> Option<ReportFamily> {
        match &self.body {
            MessageBody::StateReport { family, .. } => Some(*family),
            _ => None,
        }
    }

    /// Whether applying this message can change the device-state tree.
    pub fn is_mdib_relevant(&self) -> bool {
        !matches!(self.body, MessageBody::Other { .. })
    }

    /// Every state carried by a state report or waveform stream.
    pub fn reported_states(&self) -> Vec<&State> {
        match &self.body {
            MessageBody::StateReport { parts, .. } => {
                parts.iter().flat_map(|part| part.states.iter()).collect()
            }
            MessageBody::WaveformStream { states } => states.iter().collect(),
            _ => Vec::new(),
        }
    }
}
