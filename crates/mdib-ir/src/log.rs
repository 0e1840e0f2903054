//! The message log query surface and a JSON-backed in-memory log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manipulation::ManipulationRecord;
use crate::message::{Direction, Message};
use crate::model::Timestamp;

pub const LOG_SCHEMA_VERSION: u32 = 1;

/// Inclusive time range in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl TimeRange {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    /// The whole recording.
    pub fn all() -> Self {
        Self {
            from: Timestamp::MIN,
            to: Timestamp::MAX,
        }
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }
}

/// Read-only, side-effect free access to a recorded test run.
///
/// Results are returned in arrival order.
pub trait MessageLog: Sync {
    fn messages_for_direction_and_time_range(
        &self,
        direction: Direction,
        range: TimeRange,
    ) -> Vec<&Message>;

    /// Manipulations with the given name whose start lies in `range`.
    fn manipulations_for_name_and_time_range(
        &self,
        name: &str,
        range: TimeRange,
    ) -> Vec<&ManipulationRecord>;
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("message log JSON decode failed: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    #[error("message log schema_version must be 1, got {got}")]
    SchemaVersion { got: u32 },
    #[error(
        "message {index} arrived at {timestamp} which is before the previous message at {previous}"
    )]
    OutOfOrder {
        index: usize,
        timestamp: Timestamp,
        previous: Timestamp,
    },
}

/// A complete log held in memory, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InMemoryLog {
    pub schema_version: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub manipulations: Vec<ManipulationRecord>,
}

impl InMemoryLog {
    pub fn new(messages: Vec<Message>, manipulations: Vec<ManipulationRecord>) -> Self {
        Self {
            schema_version: LOG_SCHEMA_VERSION,
            messages,
            manipulations,
        }
    }

    /// Decodes a log and checks its schema version and arrival order.
    pub fn from_json(raw: &str) -> Result<Self, LogError> {
        let log: InMemoryLog =
            serde_json::from_str(raw).map_err(|source| LogError::Decode { source })?;
        log.validate()?;
        Ok(log)
    }

    pub fn validate(&self) -> Result<(), LogError> {
        if self.schema_version != LOG_SCHEMA_VERSION {
            return Err(LogError::SchemaVersion {
                got: self.schema_version,
            });
        }
        for (index, pair) in self.messages.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(LogError::OutOfOrder {
                    index: index + 1,
                    timestamp: pair[1].timestamp,
                    previous: pair[0].timestamp,
                });
            }
        }
        Ok(())
    }
}

impl MessageLog for InMemoryLog {
    fn messages_for_direction_and_time_range(
        &self,
        direction: Direction,
        range: TimeRange,
    ) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.direction == direction && range.contains(m.timestamp))
            .collect()
    }

    fn manipulations_for_name_and_time_range(
        &self,
        name: &str,
        range: TimeRange,
    ) -> Vec<&ManipulationRecord> {
        self.manipulations
            .iter()
            .filter(|m| m.name == name && range.contains(m.start))
            .collect()
    }
}
