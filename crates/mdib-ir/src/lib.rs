#![doc = include_str!("../README.md")]

//! MDIB data model for replaying recorded SDC message logs.
//!
//! This crate defines the descriptor/state representation of the device
//! information base, the recorded message envelopes and manipulation records,
//! and the read-only query surface over a recorded log.

pub mod descriptor;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod log;
pub mod manipulation;
pub mod message;
pub mod model;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod state;

pub use descriptor::{Descriptor, DescriptorBody};
pub use log::{InMemoryLog, LogError, MessageLog, TimeRange};
pub use manipulation::{ManipulationRecord, ManipulationResult};
pub use message::{
    DescriptionModificationPart, Direction, Mdib, Message, MessageBody, StateReportPart,
};
pub use model::*;
pub use state::{MetricValue, State, StateBody, SystemSignalActivation};
