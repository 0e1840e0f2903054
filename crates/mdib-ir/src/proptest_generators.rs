//! Proptest strategies for generating well-formed message logs.

use proptest::prelude::*;

use crate::fixtures::*;
use crate::log::InMemoryLog;
use crate::manipulation::ManipulationResult;
use crate::model::*;

pub fn arb_component_activation() -> impl Strategy<Value = ComponentActivation> {
    prop_oneof![
        Just(ComponentActivation::On),
        Just(ComponentActivation::NotReady),
        Just(ComponentActivation::StandBy),
        Just(ComponentActivation::Off),
        Just(ComponentActivation::Shutdown),
        Just(ComponentActivation::Failure),
    ]
}

pub fn arb_alert_activation() -> impl Strategy<Value = AlertActivation> {
    prop_oneof![
        Just(AlertActivation::On),
        Just(AlertActivation::Off),
        Just(AlertActivation::Paused),
    ]
}

/// One metric update: which metric, its activation and its value.
fn arb_metric_update() -> impl Strategy<Value = (bool, ComponentActivation, u16)> {
    (any::<bool>(), arb_component_activation(), any::<u16>())
}

/// Strategy for a log of one or two sessions over the standard device.
///
/// Every session starts with the standard baseline followed by 0–12 metric
/// reports and alert reports with strictly increasing mdib and state versions.
/// Generated logs:
/// - are in arrival order
/// - carry explicit versions on every report
/// - may contain a successful `setMetricStatus` manipulation per session
pub fn arb_message_log() -> impl Strategy<Value = InMemoryLog> {
    let session = (
        proptest::collection::vec(arb_metric_update(), 0..=12),
        proptest::collection::vec(arb_alert_activation(), 0..=4),
        any::<bool>(),
    );
    proptest::collection::vec(session, 1..=2).prop_map(|sessions| {
        let mut messages = Vec::new();
        let mut manipulations = Vec::new();
        let mut clock: Timestamp = 1_000;
        for (index, (metric_updates, alert_updates, manipulate)) in sessions.into_iter().enumerate() {
            let sequence_id = if index == 0 { SEQUENCE_ID } else { OTHER_SEQUENCE_ID };
            let mut version: Version = 0;
            messages.push(standard_baseline(clock, sequence_id, version));

            for (step, (use_setting, activation, value)) in metric_updates.iter().enumerate() {
                clock += 1_000;
                version += 1;
                let handle = if *use_setting { SETTING_METRIC } else { MEASUREMENT_METRIC };
                let state = metric_value_state(handle, *activation, &value.to_string())
                    .with_state_version(step as Version + 1);
                messages.push(state_report(
                    clock,
                    sequence_id,
                    version,
                    ReportFamily::Metric,
                    vec![state],
                ));
                if manipulate && step == 0 {
                    manipulations.push(set_metric_status(
                        clock - 500,
                        clock - 100,
                        ManipulationResult::Success,
                        handle,
                        if *use_setting {
                            MetricCategory::Setting
                        } else {
                            MetricCategory::Measurement
                        },
                        *activation,
                    ));
                }
            }

            for (step, activation) in alert_updates.iter().enumerate() {
                clock += 1_000;
                version += 1;
                let state = alert_system_state(ALERT_SYSTEM, *activation)
                    .with_state_version(step as Version + 1);
                messages.push(state_report(
                    clock,
                    sequence_id,
                    version,
                    ReportFamily::Alert,
                    vec![state],
                ));
            }
            clock += 10_000;
        }
        InMemoryLog::new(messages, manipulations)
    })
}
