//! An [`ExecutionContext`] bound to a [`Clock`].

use core::fmt;

use crate::StateMachine;
use crate::clock::Clock;
use crate::context::{ExecutionContext, StepReport, TriggerOutcome};
use crate::graph::{DEFAULT_MAX_EDGES, DEFAULT_MAX_STATES, StateId, TransitionGraph, TriggerId};
use crate::labels::Labels;

/// The firmware-facing machine: `begin`, `trigger`, `run`, `current_state`.
///
/// ```rust
/// use flash_fsm_core::{GraphBuilder, Machine, ManualClock, StateDef, StateId, TriggerId};
///
/// # fn main() -> Result<(), flash_fsm_core::GraphError> {
/// let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 1)?;
/// builder
///     .state(StateId(0), StateDef::empty())?
///     .state(StateId(1), StateDef::empty())?
///     .timed_transition(StateId(0), StateId(1), 500, None)?;
/// let graph = builder.finalize(StateId(0))?;
///
/// let clock = ManualClock::new(0);
/// let mut machine = Machine::begin(&graph, (), &clock);
/// clock.advance(500);
/// machine.run();
/// assert_eq!(machine.current_state(), StateId(1));
/// # Ok(())
/// # }
/// ```
pub struct Machine<
    'g,
    D,
    K,
    const S: usize = DEFAULT_MAX_STATES,
    const E: usize = DEFAULT_MAX_EDGES,
> {
    ctx: ExecutionContext<'g, D, S, E>,
    clock: K,
}

impl<'g, D, K: Clock, const S: usize, const E: usize> Machine<'g, D, K, S, E> {
    /// Enters the graph's start state at the clock's current time.
    pub fn begin(graph: &'g TransitionGraph<'g, D, S, E>, data: D, clock: K) -> Self {
        let ctx = ExecutionContext::new(graph, data, clock.now());
        Self { ctx, clock }
    }

    pub fn trigger(&mut self, trigger: impl Into<TriggerId>, immediate: bool) -> TriggerOutcome {
        let now = self.clock.now();
        self.ctx.trigger(trigger, immediate, now)
    }

    /// One cooperative tick at the clock's current time.
    pub fn run(&mut self) -> StepReport {
        let now = self.clock.now();
        self.ctx.step(now)
    }

    #[must_use]
    pub fn current_state(&self) -> StateId {
        self.ctx.current_state()
    }

    /// The current state as a derived label enum.
    #[must_use]
    pub fn state_as<L: Labels>(&self) -> Option<L> {
        L::from_index(self.ctx.current_state().0)
    }

    #[must_use]
    pub fn data(&self) -> &D {
        self.ctx.data()
    }

    pub fn data_mut(&mut self) -> &mut D {
        self.ctx.data_mut()
    }

    #[must_use]
    pub fn context(&self) -> &ExecutionContext<'g, D, S, E> {
        &self.ctx
    }

    #[must_use]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    #[must_use]
    pub fn into_parts(self) -> (ExecutionContext<'g, D, S, E>, K) {
        (self.ctx, self.clock)
    }
}

impl<D, K: Clock, const S: usize, const E: usize> StateMachine for Machine<'_, D, K, S, E> {
    type Data = D;

    fn trigger(&mut self, trigger: TriggerId, immediate: bool) -> TriggerOutcome {
        Machine::trigger(self, trigger, immediate)
    }

    fn step(&mut self) -> StepReport {
        self.run()
    }

    fn state(&self) -> StateId {
        self.current_state()
    }

    fn data(&self) -> &D {
        Machine::data(self)
    }

    fn data_mut(&mut self) -> &mut D {
        Machine::data_mut(self)
    }
}

impl<D, K, const S: usize, const E: usize> fmt::Display for Machine<'_, D, K, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}
