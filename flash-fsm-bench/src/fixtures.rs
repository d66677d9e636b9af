//! Benchmark fixtures: packed label buffers and prebuilt graphs

use flash_fsm_core::{
    GraphBuilder, GraphError, Scope, StateDef, StateId, States, TransitionGraph, TriggerId,
    Triggers,
};

/// `count` labels named `label-<n>`, packed and double-terminated.
#[must_use]
pub fn label_bytes(count: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..count {
        bytes.extend_from_slice(format!("label-{i}").as_bytes());
        bytes.push(0);
    }
    bytes.push(0);
    bytes
}

fn count_entry(scope: &mut Scope<'_, u32>) {
    *scope.data_mut() = scope.data().wrapping_add(1);
}

/// `states` states in a cycle, each advanced by trigger 0.
///
/// # Errors
/// Fails when `states` is zero or exceeds the default graph capacity.
pub fn ring_graph(states: u8) -> Result<TransitionGraph<'static, u32>, GraphError> {
    let mut builder: GraphBuilder<'static, u32> = GraphBuilder::new(states.into(), 1)?;
    for state in 0..states {
        let next = (state + 1) % states;
        builder
            .state(StateId(state), StateDef::empty().enter(count_entry))?
            .transition(StateId(state), StateId(next), TriggerId(0), None)?;
    }
    builder.finalize(StateId(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
pub enum Phase {
    Idle,
    Rise,
    Hold,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Triggers)]
pub enum Pulse {
    Kick,
}

fn sample(scope: &mut Scope<'_, u32>) -> Option<TriggerId> {
    *scope.data_mut() = scope.data().wrapping_add(1);
    None
}

/// Four labeled phases chained by 1ms timed edges, with `Kick` restarting
/// from `Idle`. Every phase has an `on_step`, so each tick does real work.
///
/// # Errors
/// Only if the derived label tables disagree with the graph size.
pub fn phase_graph() -> Result<TransitionGraph<'static, u32>, GraphError> {
    let mut builder = GraphBuilder::for_labels::<Phase, Pulse>()?;
    let order = [Phase::Idle, Phase::Rise, Phase::Hold, Phase::Fall];
    for (i, phase) in order.iter().copied().enumerate() {
        let next = order[(i + 1) % order.len()];
        builder
            .state(phase, StateDef::empty().enter(count_entry).step(sample))?
            .timed_transition(phase, next, 1, None)?;
        if phase != Phase::Idle {
            builder.transition(phase, Phase::Idle, Pulse::Kick, None)?;
        }
    }
    builder.finalize(Phase::Idle)
}
