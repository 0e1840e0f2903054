//! Per-session bookkeeping of every observed version.
//!
//! Each (handle, version kind) pair moves through
//! `Unseen -> ImpliedZero | Explicit(n)`. A version that is not transmitted is
//! only legal while the pair is still `Unseen`.

use std::collections::HashMap;
use std::fmt;

use mdib_ir::{Handle, Version};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    /// `Descriptor/@DescriptorVersion`
    Descriptor,
    /// `State/@StateVersion`, keyed by the state key.
    State,
    /// `State/@DescriptorVersion`, keyed by the state key.
    StateDescriptor,
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionKind::Descriptor => "descriptor version",
            VersionKind::State => "state version",
            VersionKind::StateDescriptor => "descriptor version of the state",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "version", rename_all = "snake_case")]
pub enum VersionStatus {
    Unseen,
    ImpliedZero,
    Explicit(Version),
}

impl VersionStatus {
    pub fn resolved(&self) -> Option<Version> {
        match self {
            VersionStatus::Unseen => None,
            VersionStatus::ImpliedZero => Some(0),
            VersionStatus::Explicit(version) => Some(*version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum VersionProblem {
    /// Not transmitted although the pair was observed before.
    ImpliedAfterObserved { previous: VersionStatus },
    Decreased { previous: Version, current: Version },
}

/// Result of observing one transmitted (or missing) version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub resolved: Version,
    pub problem: Option<VersionProblem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionLedger {
    entries: HashMap<(Handle, VersionKind), VersionStatus>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, handle: &str, kind: VersionKind) -> VersionStatus {
        self.entries
            .get(&(handle.to_string(), kind))
            .copied()
            .unwrap_or(VersionStatus::Unseen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records one appearance of `handle` and resolves its version.
    ///
    /// A missing version resolves to zero. The recorded status is only
    /// replaced by explicit versions, so a rejected implied appearance never
    /// lowers the value later versions are compared against.
    pub fn observe(
        &mut self,
        handle: &str,
        kind: VersionKind,
        transmitted: Option<Version>,
    ) -> Observation {
        let key = (handle.to_string(), kind);
        let previous = self
            .entries
            .get(&key)
            .copied()
            .unwrap_or(VersionStatus::Unseen);

        match (transmitted, previous) {
            (None, VersionStatus::Unseen) => {
                self.entries.insert(key, VersionStatus::ImpliedZero);
                Observation {
                    resolved: 0,
                    problem: None,
                }
            }
            (None, previous) => Observation {
                resolved: 0,
                problem: Some(VersionProblem::ImpliedAfterObserved { previous }),
            },
            (Some(current), previous) => {
                self.entries.insert(key, VersionStatus::Explicit(current));
                let problem = previous
                    .resolved()
                    .filter(|previous| current < *previous)
                    .map(|previous| VersionProblem::Decreased { previous, current });
                Observation {
                    resolved: current,
                    problem,
                }
            }
        }
    }
}
