//! Replaying the same log twice yields the same trees and the same verdicts.

use std::ops::ControlFlow;

use mdib_conformance::{partition_sessions, Engine, EngineConfig, StateTree};
use mdib_ir::proptest_generators::arb_message_log;
use mdib_ir::InMemoryLog;
use proptest::prelude::*;

/// Every intermediate tree of every session, in replay order.
fn snapshots(log: &InMemoryLog) -> Vec<StateTree> {
    let mut trees = Vec::new();
    for session in partition_sessions(log) {
        let flow = session
            .replay(|step| {
                trees.push(step.after.clone());
                ControlFlow::<()>::Continue(())
            })
            .expect("generated logs replay cleanly");
        assert_eq!(flow, ControlFlow::Continue(()));
    }
    trees
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replay_is_deterministic(log in arb_message_log()) {
        let first = snapshots(&log);
        let second = snapshots(&log);
        prop_assert!(!first.is_empty());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn verdicts_are_deterministic(log in arb_message_log()) {
        let engine = Engine::new(EngineConfig::default());
        let first = engine.run(&log).expect("generated logs evaluate");
        let second = engine.run(&log).expect("generated logs evaluate");
        prop_assert_eq!(first, second);
    }
}
