//! Manipulation-Correlation: a successful `setMetricStatus` manipulation is
//! reflected by the device in a metric report or waveform stream shortly
//! after it finished.

use std::time::Duration;

use mdib_ir::manipulation::MANIPULATION_SET_METRIC_STATUS;
use mdib_ir::{
    ComponentActivation, Direction, ManipulationRecord, Message, MessageBody, MessageLog,
    MetricCategory, ReportFamily, TimeRange, Timestamp,
};
use tracing::debug;

use super::{EvaluationContext, EvaluationError, Family, Requirement};
use crate::verdict::{Failure, Verdict};

pub const NO_SUCCESSFUL_MANIPULATION: &str =
    "No successful setMetricStatus manipulation seen, test failed.";

/// One requirement per metric category and requested activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricStatusManipulation {
    id: &'static str,
    category: MetricCategory,
    activation: ComponentActivation,
}

/// Whether `message` may carry evidence for a metric manipulation.
fn is_metric_evidence(message: &Message) -> bool {
    match &message.body {
        MessageBody::StateReport { family, .. } => *family == ReportFamily::Metric,
        MessageBody::WaveformStream { .. } => true,
        _ => false,
    }
}

fn cutoff(finish: Timestamp, buffer: Duration) -> Timestamp {
    let buffer = Timestamp::try_from(buffer.as_nanos()).unwrap_or(Timestamp::MAX);
    finish.saturating_add(buffer)
}

impl MetricStatusManipulation {
    pub const fn new(
        id: &'static str,
        category: MetricCategory,
        activation: ComponentActivation,
    ) -> Self {
        Self {
            id,
            category,
            activation,
        }
    }

    pub fn category(&self) -> MetricCategory {
        self.category
    }

    pub fn activation(&self) -> ComponentActivation {
        self.activation
    }

    fn matches(&self, record: &ManipulationRecord) -> bool {
        record.metric_category() == Some(self.category)
            && record.requested_activation() == Some(self.activation)
    }

    /// Evaluates every matching manipulation with `buffer` as the grace
    /// period after it finished.
    pub fn check(&self, log: &dyn MessageLog, buffer: Duration) -> Verdict {
        let manipulations: Vec<&ManipulationRecord> = log
            .manipulations_for_name_and_time_range(MANIPULATION_SET_METRIC_STATUS, TimeRange::all())
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        if manipulations.is_empty() {
            return Verdict::no_test_data(format!(
                "No setMetricStatus manipulation for metrics with category {} performed, test failed.",
                self.category
            ));
        }

        let mut successful_seen = false;
        for record in manipulations.into_iter().filter(|record| record.is_success()) {
            successful_seen = true;
            if let Err(failure) = self.check_record(log, record, buffer) {
                return Verdict::Fail(failure);
            }
        }
        if successful_seen {
            Verdict::Pass
        } else {
            Verdict::no_test_data(NO_SUCCESSFUL_MANIPULATION)
        }
    }

    fn check_record(
        &self,
        log: &dyn MessageLog,
        record: &ManipulationRecord,
        buffer: Duration,
    ) -> Result<(), Failure> {
        let Some(handle) = record.handle() else {
            return Err(Failure::new(format!(
                "The {} manipulation started at {} carries no Handle parameter",
                record.name, record.start
            )));
        };
        let window = TimeRange::new(record.start, cutoff(record.finish, buffer));
        let carries_handle = |message: &Message| {
            message
                .reported_states()
                .iter()
                .any(|state| state.descriptor_handle == handle)
        };

        // Highest mdib version wins; the earliest arrival breaks ties.
        let mut selected: Option<&Message> = None;
        for message in log
            .messages_for_direction_and_time_range(Direction::Inbound, window)
            .into_iter()
            .filter(|message| is_metric_evidence(message) && carries_handle(message))
        {
            if selected.map_or(true, |current| message.version() > current.version()) {
                selected = Some(message);
            }
        }
        let Some(message) = selected else {
            return Err(Failure::new(format!(
                "No metric reports or waveform streams for {} manipulation found between {} and {}, test failed.",
                record.name, window.from, window.to
            ))
            .with_handles([handle]));
        };
        debug!(
            requirement = self.id,
            handle,
            sequence_id = %message.sequence_id,
            mdib_version = message.version(),
            "manipulation correlated"
        );

        let actual = message
            .reported_states()
            .into_iter()
            .find(|state| state.descriptor_handle == handle)
            .and_then(|state| state.component_activation());
        if actual == Some(self.activation) {
            return Ok(());
        }
        let mut failure = Failure::new(format!(
            "The manipulated activation state for metric {handle} should be {} but is {}",
            self.activation,
            actual.map_or("unknown", |activation| activation.as_str())
        ))
        .with_handles([handle]);
        failure.sequence_id = Some(message.sequence_id.clone());
        failure.mdib_version = Some(message.version());
        Err(failure)
    }
}

impl Requirement for MetricStatusManipulation {
    fn id(&self) -> &'static str {
        self.id
    }

    fn family(&self) -> Family {
        Family::ManipulationCorrelation
    }

    fn description(&self) -> &'static str {
        "A successful setMetricStatus manipulation is reported with the requested activation"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Verdict, EvaluationError> {
        Ok(self.check(ctx.log, ctx.config.manipulation_buffer()))
    }
}
