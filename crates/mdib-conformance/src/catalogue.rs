//! Requirement identifiers and the full requirement catalogue.

use mdib_ir::{ComponentActivation, MetricCategory, ReportFamily};

use crate::requirements::activation::{
    AlertSystemInactivation, ComponentOffPropagation, PresenceImpliesActivation,
    SystemSignalActivationConsistency,
};
use crate::requirements::change::{
    DescriptionModificationGenuine, NoNestedDescriptors, PartOrdering, StateReportGenuine,
};
use crate::requirements::context::SingleAssociation;
use crate::requirements::handles::{MultiStateHandles, PrintableHandles, UniqueHandles};
use crate::requirements::manipulation::MetricStatusManipulation;
use crate::requirements::versioning::{
    ChildSetVersioning, DescriptorContentVersioning, PartStateDescriptorVersion,
    StateContentVersioning, VersionsNeverDecrease,
};
use crate::requirements::Requirement;

// Version-Monotonicity
pub const BICEPS_R0033: &str = "BICEPS.R0033";
pub const BICEPS_R0034_0: &str = "BICEPS.R0034_0";
pub const BICEPS_R0038_0: &str = "BICEPS.R0038_0";
pub const BICEPS_R5003: &str = "BICEPS.R5003";
pub const BICEPS_R5051: &str = "BICEPS.R5051";
pub const BICEPS_R5052: &str = "BICEPS.R5052";

// Change-Authenticity
pub const BICEPS_C_5: &str = "BICEPS.C-5";
pub const BICEPS_C_11: &str = "BICEPS.C-11";
pub const BICEPS_C_12: &str = "BICEPS.C-12";
pub const BICEPS_C_13: &str = "BICEPS.C-13";
pub const BICEPS_C_14: &str = "BICEPS.C-14";
pub const BICEPS_C_15: &str = "BICEPS.C-15";
pub const BICEPS_R5024: &str = "BICEPS.R5024";
pub const BICEPS_R5025_0: &str = "BICEPS.R5025_0";

// Hierarchical-Activation
pub const BICEPS_R0029_0: &str = "BICEPS.R0029_0";
pub const BICEPS_B_128: &str = "BICEPS.B-128";
pub const BICEPS_R0116: &str = "BICEPS.R0116";
pub const BICEPS_R0025_0: &str = "BICEPS.R0025_0";

// Handle-Integrity
pub const BICEPS_R0007_0: &str = "BICEPS.R0007_0";
pub const BICEPS_R0105_0: &str = "BICEPS.R0105_0";
pub const BICEPS_R0097: &str = "BICEPS.R0097";

// Context-Association
pub const BICEPS_R0124: &str = "BICEPS.R0124";
pub const BICEPS_R0133: &str = "BICEPS.R0133";

// Manipulation-Correlation
pub const BICEPS_547_0_0: &str = "BICEPS.5-4-7_0_0";
pub const BICEPS_547_1: &str = "BICEPS.5-4-7_1";
pub const BICEPS_547_2: &str = "BICEPS.5-4-7_2";
pub const BICEPS_547_3: &str = "BICEPS.5-4-7_3";
pub const BICEPS_547_4: &str = "BICEPS.5-4-7_4";
pub const BICEPS_547_5: &str = "BICEPS.5-4-7_5";
pub const BICEPS_547_6_0: &str = "BICEPS.5-4-7_6_0";
pub const BICEPS_547_7: &str = "BICEPS.5-4-7_7";
pub const BICEPS_547_8: &str = "BICEPS.5-4-7_8";
pub const BICEPS_547_10: &str = "BICEPS.5-4-7_10";
pub const BICEPS_547_12_0: &str = "BICEPS.5-4-7_12_0";
pub const BICEPS_547_14: &str = "BICEPS.5-4-7_14";
pub const BICEPS_547_16: &str = "BICEPS.5-4-7_16";

/// Category and requested activation of every manipulation requirement.
pub const METRIC_STATUS_MANIPULATIONS: &[(&str, MetricCategory, ComponentActivation)] = &[
    (BICEPS_547_0_0, MetricCategory::Measurement, ComponentActivation::On),
    (BICEPS_547_1, MetricCategory::Measurement, ComponentActivation::NotReady),
    (BICEPS_547_2, MetricCategory::Measurement, ComponentActivation::StandBy),
    (BICEPS_547_3, MetricCategory::Measurement, ComponentActivation::Shutdown),
    (BICEPS_547_4, MetricCategory::Measurement, ComponentActivation::Off),
    (BICEPS_547_5, MetricCategory::Measurement, ComponentActivation::Failure),
    (BICEPS_547_6_0, MetricCategory::Setting, ComponentActivation::On),
    (BICEPS_547_7, MetricCategory::Setting, ComponentActivation::NotReady),
    (BICEPS_547_8, MetricCategory::Setting, ComponentActivation::StandBy),
    (BICEPS_547_10, MetricCategory::Setting, ComponentActivation::Off),
    (BICEPS_547_12_0, MetricCategory::Calculation, ComponentActivation::On),
    (BICEPS_547_14, MetricCategory::Calculation, ComponentActivation::StandBy),
    (BICEPS_547_16, MetricCategory::Calculation, ComponentActivation::Off),
];

/// Every requirement, in reporting order.
pub fn catalogue() -> Vec<Box<dyn Requirement>> {
    let mut requirements: Vec<Box<dyn Requirement>> = vec![
        Box::new(ChildSetVersioning),
        Box::new(DescriptorContentVersioning),
        Box::new(StateContentVersioning),
        Box::new(VersionsNeverDecrease),
        Box::new(PartStateDescriptorVersion::created()),
        Box::new(PartStateDescriptorVersion::updated()),
        Box::new(DescriptionModificationGenuine),
        Box::new(StateReportGenuine::new(ReportFamily::Alert)),
        Box::new(StateReportGenuine::new(ReportFamily::Component)),
        Box::new(StateReportGenuine::new(ReportFamily::Context)),
        Box::new(StateReportGenuine::new(ReportFamily::Metric)),
        Box::new(StateReportGenuine::new(ReportFamily::Operational)),
        Box::new(NoNestedDescriptors),
        Box::new(PartOrdering),
        Box::new(PresenceImpliesActivation),
        Box::new(SystemSignalActivationConsistency),
        Box::new(AlertSystemInactivation),
        Box::new(ComponentOffPropagation),
        Box::new(UniqueHandles),
        Box::new(PrintableHandles),
        Box::new(MultiStateHandles),
        Box::new(SingleAssociation::patient()),
        Box::new(SingleAssociation::location()),
    ];
    requirements.extend(
        METRIC_STATUS_MANIPULATIONS
            .iter()
            .map(|&(id, category, activation)| {
                Box::new(MetricStatusManipulation::new(id, category, activation))
                    as Box<dyn Requirement>
            }),
    );
    requirements
}

pub fn requirement_ids() -> Vec<&'static str> {
    catalogue().iter().map(|requirement| requirement.id()).collect()
}

pub fn is_known(id: &str) -> bool {
    find(id).is_some()
}

pub fn find(id: &str) -> Option<Box<dyn Requirement>> {
    catalogue()
        .into_iter()
        .find(|requirement| requirement.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::requirements::Family;

    #[test]
    fn identifiers_are_unique_and_prefixed() {
        let ids = requirement_ids();
        assert_eq!(ids.len(), 36);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.starts_with("BICEPS.")));
    }

    #[test]
    fn every_family_is_represented() {
        let families: HashSet<Family> = catalogue()
            .iter()
            .map(|requirement| requirement.family())
            .collect();
        assert_eq!(families.len(), 6);
    }

    #[test]
    fn find_resolves_manipulation_requirements() {
        let requirement = find(BICEPS_547_14).unwrap();
        assert_eq!(requirement.family(), Family::ManipulationCorrelation);
        assert!(is_known(BICEPS_R5025_0));
        assert_eq!(find(BICEPS_R0133).unwrap().family(), Family::ContextAssociation);
        assert!(!is_known("BICEPS.R0000"));
    }
}
