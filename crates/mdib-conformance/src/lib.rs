#![doc = include_str!("../README.md")]

//! Conformance engine for recorded SDC message logs.
//!
//! A log is split into sessions by sequence id. Each session is replayed
//! message by message into a [`tree::StateTree`] while a
//! [`ledger::VersionLedger`] tracks every descriptor and state version seen.
//! Requirements observe the replayed steps and produce a [`verdict::Verdict`].

pub mod catalogue;
pub mod config;
pub mod engine;
pub mod equality;
pub mod ledger;
pub mod replay;
pub mod requirements;
pub mod tree;
pub mod verdict;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineReport, RequirementReport};
pub use replay::{partition_sessions, ReplayError, Replayer, SessionHistory, Step};
pub use requirements::{EvaluationContext, EvaluationError, Family, Requirement};
pub use tree::{StateTree, StructureError};
pub use verdict::{Failure, Verdict};
