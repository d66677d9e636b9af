//! Per-instance execution state and the cooperative step protocol.

use core::fmt;

use crate::clock::Millis;
use crate::graph::{
    ActionFn, DEFAULT_MAX_EDGES, DEFAULT_MAX_STATES, StateId, TransitionGraph, TriggerId,
};

/// Capability handle passed to every hook.
///
/// A hook can read and mutate its instance's data and request a trigger for the
/// next step. It can never move the machine itself.
pub struct Scope<'s, D> {
    state: StateId,
    now: Millis,
    trigger_count: usize,
    data: &'s mut D,
    pending: &'s mut Option<TriggerId>,
}

impl<D> Scope<'_, D> {
    /// The state this hook belongs to. For a transition action this is the
    /// state being left.
    #[must_use]
    pub fn state(&self) -> StateId {
        self.state
    }

    #[must_use]
    pub fn now(&self) -> Millis {
        self.now
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut *self.data
    }

    /// Queues `trigger` for the next step. The last request wins.
    pub fn set_trigger(&mut self, trigger: impl Into<TriggerId>) -> TriggerOutcome {
        queue(self.pending, self.trigger_count, trigger.into())
    }

    #[must_use]
    pub fn pending_trigger(&self) -> Option<TriggerId> {
        *self.pending
    }
}

fn queue(
    pending: &mut Option<TriggerId>,
    trigger_count: usize,
    trigger: TriggerId,
) -> TriggerOutcome {
    if trigger.index() >= trigger_count {
        fsm_warn!("[QUEUE] unknown trigger {} ignored", trigger);
        return TriggerOutcome::Unknown;
    }
    let replaced = pending.replace(trigger);
    fsm_trace!("[QUEUE] {} (replaced {:?})", trigger, replaced);
    TriggerOutcome::Queued { replaced }
}

/// What moved the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Trigger(TriggerId),
    Timer { after_ms: u32 },
}

/// One completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub cause: Cause,
}

/// Result of [`ExecutionContext::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Transitioned(Transition),
    /// The current state has no edge for this trigger. Nothing ran.
    NoMatch,
    /// Stored for the next step, possibly displacing an earlier request.
    Queued { replaced: Option<TriggerId> },
    /// The trigger id is outside the graph. Nothing ran or was stored.
    Unknown,
}

/// What happened during one [`ExecutionContext::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The pending trigger taken at the start of the step.
    pub consumed: Option<TriggerId>,
    /// The trigger `on_step` asked for, applied next step.
    pub requested: Option<TriggerId>,
    /// Transition caused by `consumed`.
    pub transition: Option<Transition>,
    pub timed: Option<Transition>,
}

impl StepReport {
    #[must_use]
    pub fn transitioned(&self) -> bool {
        self.transition.is_some() || self.timed.is_some()
    }
}

/// One running instance of a [`TransitionGraph`].
///
/// The graph is shared; everything mutable lives here. Time is passed in
/// explicitly as [`Millis`], see [`Machine`](crate::Machine) for a version bound
/// to a [`Clock`](crate::Clock).
///
/// ```rust
/// use flash_fsm_core::{ExecutionContext, GraphBuilder, Millis, StateDef, StateId, TriggerId};
///
/// # fn main() -> Result<(), flash_fsm_core::GraphError> {
/// let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 1)?;
/// builder
///     .state(StateId(0), StateDef::empty())?
///     .state(StateId(1), StateDef::empty())?
///     .transition(StateId(0), StateId(1), TriggerId(0), None)?;
/// let graph = builder.finalize(StateId(0))?;
///
/// let mut ctx = ExecutionContext::new(&graph, (), Millis(0));
/// ctx.trigger(TriggerId(0), false, Millis(0));
/// assert_eq!(ctx.current_state(), StateId(0));
/// ctx.step(Millis(1));
/// assert_eq!(ctx.current_state(), StateId(1));
/// # Ok(())
/// # }
/// ```
pub struct ExecutionContext<
    'g,
    D,
    const S: usize = DEFAULT_MAX_STATES,
    const E: usize = DEFAULT_MAX_EDGES,
> {
    graph: &'g TransitionGraph<'g, D, S, E>,
    current: StateId,
    pending: Option<TriggerId>,
    entered_at: Millis,
    data: D,
}

impl<'g, D, const S: usize, const E: usize> ExecutionContext<'g, D, S, E> {
    /// Creates an instance in the graph's start state and runs its enter hook.
    pub fn new(graph: &'g TransitionGraph<'g, D, S, E>, data: D, now: Millis) -> Self {
        let mut ctx = Self {
            graph,
            current: graph.start(),
            pending: None,
            entered_at: now,
            data,
        };
        fsm_trace!("[START] entering {}", graph.state_label(ctx.current));
        ctx.run_enter(now);
        ctx
    }

    /// Fires `trigger`.
    ///
    /// With `immediate` the edge for `(current, trigger)` is taken right away;
    /// otherwise the trigger waits for the next [`step`](Self::step).
    pub fn trigger(
        &mut self,
        trigger: impl Into<TriggerId>,
        immediate: bool,
        now: Millis,
    ) -> TriggerOutcome {
        let trigger = trigger.into();
        if trigger.index() >= self.graph.trigger_count() {
            fsm_warn!("[TRIGGER] unknown trigger {} ignored", trigger);
            return TriggerOutcome::Unknown;
        }
        if !immediate {
            return queue(&mut self.pending, self.graph.trigger_count(), trigger);
        }
        match self.apply(trigger, now) {
            Some(transition) => TriggerOutcome::Transitioned(transition),
            None => TriggerOutcome::NoMatch,
        }
    }

    /// Runs one cooperative tick.
    ///
    /// A pending trigger is consumed and applied in place of `on_step`.
    /// Otherwise `on_step` runs and whatever it returns is queued. Either way
    /// the current state's timed edge is then checked, and fires at most once.
    pub fn step(&mut self, now: Millis) -> StepReport {
        let graph = self.graph;
        let mut report = StepReport::default();

        if let Some(trigger) = self.pending.take() {
            report.consumed = Some(trigger);
            report.transition = self.apply(trigger, now);
        } else if let Some(on_step) = graph.state_def(self.current).and_then(|def| def.on_step) {
            let requested = on_step(&mut self.scope(self.current, now));
            if let Some(trigger) = requested {
                let outcome = queue(&mut self.pending, graph.trigger_count(), trigger);
                if let TriggerOutcome::Queued { .. } = outcome {
                    report.requested = Some(trigger);
                }
            }
        }

        if let Some(timed) = graph.timed_edge(self.current) {
            let elapsed = now.elapsed_since(self.entered_at);
            if elapsed >= timed.interval_ms {
                fsm_trace!(
                    "[TIMER] {} after {}ms",
                    graph.state_label(self.current),
                    elapsed
                );
                let cause = Cause::Timer {
                    after_ms: timed.interval_ms,
                };
                let transition = self.transition_to(timed.to, timed.on_transition, cause, now);
                report.timed = Some(transition);
            }
        }

        report
    }

    #[must_use]
    pub fn current_state(&self) -> StateId {
        self.current
    }

    #[must_use]
    pub fn pending_trigger(&self) -> Option<TriggerId> {
        self.pending
    }

    /// When the current state was entered.
    #[must_use]
    pub fn entered_at(&self) -> Millis {
        self.entered_at
    }

    #[must_use]
    pub fn graph(&self) -> &'g TransitionGraph<'g, D, S, E> {
        self.graph
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    #[must_use]
    pub fn into_data(self) -> D {
        self.data
    }

    /// Writes the current state's label.
    ///
    /// # Errors
    /// Propagates errors from `sink`.
    pub fn render<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        write!(sink, "{}", self.graph.state_label(self.current))
    }

    fn apply(&mut self, trigger: TriggerId, now: Millis) -> Option<Transition> {
        let graph = self.graph;
        let Some(edge) = graph.edge(self.current, trigger) else {
            fsm_trace!(
                "[TRIGGER] {} has no edge for {}",
                graph.state_label(self.current),
                graph.trigger_label(trigger)
            );
            return None;
        };
        let cause = Cause::Trigger(trigger);
        Some(self.transition_to(edge.to, edge.on_transition, cause, now))
    }

    /// exit(old), action, switch, enter(new). Self-loops run all four.
    fn transition_to(
        &mut self,
        to: StateId,
        action: Option<ActionFn<D>>,
        cause: Cause,
        now: Millis,
    ) -> Transition {
        let from = self.current;
        if let Some(on_exit) = self.graph.state_def(from).and_then(|def| def.on_exit) {
            on_exit(&mut self.scope(from, now));
        }
        if let Some(action) = action {
            action(&mut self.scope(from, now));
        }
        self.current = to;
        self.entered_at = now;
        fsm_trace!(
            "[TRANSITION] {} -> {} ({:?})",
            self.graph.state_label(from),
            self.graph.state_label(to),
            cause
        );
        self.run_enter(now);
        Transition { from, to, cause }
    }

    fn run_enter(&mut self, now: Millis) {
        let state = self.current;
        if let Some(on_enter) = self.graph.state_def(state).and_then(|def| def.on_enter) {
            on_enter(&mut self.scope(state, now));
        }
    }

    fn scope(&mut self, state: StateId, now: Millis) -> Scope<'_, D> {
        Scope {
            state,
            now,
            trigger_count: self.graph.trigger_count(),
            data: &mut self.data,
            pending: &mut self.pending,
        }
    }
}

impl<D, const S: usize, const E: usize> fmt::Display for ExecutionContext<'_, D, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

impl<D: fmt::Debug, const S: usize, const E: usize> fmt::Debug for ExecutionContext<'_, D, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("current", &self.current)
            .field("pending", &self.pending)
            .field("entered_at", &self.entered_at)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
