//! Records of externally triggered manipulations of the device under test.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::*;

pub const MANIPULATION_SET_METRIC_STATUS: &str = "setMetricStatus";

pub const PARAMETER_HANDLE: &str = "Handle";
pub const PARAMETER_METRIC_CATEGORY: &str = "MetricCategory";
pub const PARAMETER_COMPONENT_ACTIVATION: &str = "ComponentActivation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationResult {
    Success,
    Fail,
    NotSupported,
    NotImplemented,
}

/// One manipulation, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManipulationRecord {
    pub name: String,
    pub start: Timestamp,
    pub finish: Timestamp,
    pub result: ManipulationResult,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ManipulationRecord {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.result == ManipulationResult::Success
    }

    /// The manipulated handle.
    pub fn handle(&self) -> Option<&str> {
        self.parameter(PARAMETER_HANDLE)
    }

    /// The targeted metric category, `None` when absent or not a valid code.
    pub fn metric_category(&self) -> Option<MetricCategory> {
        self.parameter(PARAMETER_METRIC_CATEGORY)?.parse().ok()
    }

    /// The requested activation, `None` when absent or not a valid code.
    pub fn requested_activation(&self) -> Option<ComponentActivation> {
        self.parameter(PARAMETER_COMPONENT_ACTIVATION)?.parse().ok()
    }
}
