//! Immutable transition graphs and the builder that produces them.
//!
//! A [`TransitionGraph`] is the shared, read-only half of a machine: the per-state
//! hooks, the `(state, trigger) -> state` edges and at most one timed edge per
//! state. It carries no per-instance data, so a single graph can back any
//! number of [`ExecutionContext`](crate::ExecutionContext)s.

use core::fmt;

use crate::context::Scope;
use crate::labels::{Label, LabelKind, LabelTable, Labels};

/// Default maximum number of states per graph.
pub const DEFAULT_MAX_STATES: usize = 16;
/// Default maximum number of triggered edges per graph.
pub const DEFAULT_MAX_EDGES: usize = 32;

const MAX_IDS: usize = u8::MAX as usize;

/// Index of a state in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u8);

/// Index of a trigger in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u8);

impl StateId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TriggerId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Runs when a state is entered.
pub type EnterFn<D> = fn(&mut Scope<'_, D>);
/// Runs once per step while the state is current; may request a trigger.
pub type StepFn<D> = fn(&mut Scope<'_, D>) -> Option<TriggerId>;
/// Runs when a state is left.
pub type ExitFn<D> = fn(&mut Scope<'_, D>);
/// Runs between the exit and enter hooks of a transition.
pub type ActionFn<D> = fn(&mut Scope<'_, D>);

/// The hooks of one state. Every hook is optional.
///
/// ```rust
/// use flash_fsm_core::{Scope, StateDef};
///
/// fn count(scope: &mut Scope<'_, u32>) {
///     *scope.data_mut() += 1;
/// }
///
/// let def: StateDef<u32> = StateDef::empty().enter(count).exit(count);
/// # let _ = def;
/// ```
pub struct StateDef<D> {
    pub(crate) on_enter: Option<EnterFn<D>>,
    pub(crate) on_step: Option<StepFn<D>>,
    pub(crate) on_exit: Option<ExitFn<D>>,
}

impl<D> Clone for StateDef<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for StateDef<D> {}

impl<D> fmt::Debug for StateDef<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDef")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_step", &self.on_step.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

impl<D> Default for StateDef<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D> StateDef<D> {
    /// A state with no hooks. Still counts as installed.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            on_enter: None,
            on_step: None,
            on_exit: None,
        }
    }

    #[must_use]
    pub fn enter(mut self, hook: EnterFn<D>) -> Self {
        self.on_enter = Some(hook);
        self
    }

    #[must_use]
    pub fn step(mut self, hook: StepFn<D>) -> Self {
        self.on_step = Some(hook);
        self
    }

    #[must_use]
    pub fn exit(mut self, hook: ExitFn<D>) -> Self {
        self.on_exit = Some(hook);
        self
    }

    #[must_use]
    pub fn has_enter(&self) -> bool {
        self.on_enter.is_some()
    }

    #[must_use]
    pub fn has_step(&self) -> bool {
        self.on_step.is_some()
    }

    #[must_use]
    pub fn has_exit(&self) -> bool {
        self.on_exit.is_some()
    }
}

/// A triggered edge `(from, trigger) -> to`.
pub struct Edge<D> {
    pub from: StateId,
    pub trigger: TriggerId,
    pub to: StateId,
    pub on_transition: Option<ActionFn<D>>,
}

/// An edge taken once `interval_ms` has passed since `from` was entered.
pub struct TimedEdge<D> {
    pub from: StateId,
    pub to: StateId,
    pub interval_ms: u32,
    pub on_transition: Option<ActionFn<D>>,
}

impl<D> Clone for Edge<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Edge<D> {}

impl<D> Clone for TimedEdge<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for TimedEdge<D> {}

impl<D> fmt::Debug for Edge<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("from", &self.from)
            .field("trigger", &self.trigger)
            .field("to", &self.to)
            .field("has_action", &self.on_transition.is_some())
            .finish()
    }
}

impl<D> fmt::Debug for TimedEdge<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedEdge")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("interval_ms", &self.interval_ms)
            .field("has_action", &self.on_transition.is_some())
            .finish()
    }
}

/// Errors raised while building a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    NoStates,
    NoTriggers,
    TooManyStates { requested: usize, max: usize },
    TooManyTriggers { requested: usize, max: usize },
    UnknownState(StateId),
    UnknownTrigger(TriggerId),
    TooManyEdges { capacity: usize },
    /// No definition was installed for this state before `finalize`.
    MissingState(StateId),
    /// A label table's entry count differs from the graph's id count.
    LabelMismatch {
        kind: LabelKind,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NoStates => write!(f, "a graph needs at least one state"),
            GraphError::NoTriggers => write!(f, "a graph needs at least one trigger"),
            GraphError::TooManyStates { requested, max } => {
                write!(f, "{requested} states requested, at most {max} supported")
            }
            GraphError::TooManyTriggers { requested, max } => {
                write!(f, "{requested} triggers requested, at most {max} supported")
            }
            GraphError::UnknownState(id) => write!(f, "state {id} is not part of this graph"),
            GraphError::UnknownTrigger(id) => write!(f, "trigger {id} is not part of this graph"),
            GraphError::TooManyEdges { capacity } => {
                write!(f, "edge table is full ({capacity} edges)")
            }
            GraphError::MissingState(id) => write!(f, "state {id} has no definition"),
            GraphError::LabelMismatch {
                kind,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{kind} labels: expected {expected} entries, found {found}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

type LabelPair<'a> = (&'a (dyn LabelTable + Sync), &'a (dyn LabelTable + Sync));

/// Collects states and edges, then checks them once in [`GraphBuilder::finalize`].
///
/// ```rust
/// use flash_fsm_core::{GraphBuilder, StateDef, StateId, TransitionGraph, TriggerId};
///
/// # fn main() -> Result<(), flash_fsm_core::GraphError> {
/// let (a, b, go) = (StateId(0), StateId(1), TriggerId(0));
/// let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 1)?;
/// builder
///     .state(a, StateDef::empty())?
///     .state(b, StateDef::empty())?
///     .transition(a, b, go, None)?;
/// let graph: TransitionGraph<'_, ()> = builder.finalize(a)?;
/// assert_eq!(graph.edge(a, go).map(|e| e.to), Some(b));
/// # Ok(())
/// # }
/// ```
pub struct GraphBuilder<
    'a,
    D,
    const S: usize = DEFAULT_MAX_STATES,
    const E: usize = DEFAULT_MAX_EDGES,
> {
    state_count: usize,
    trigger_count: usize,
    states: heapless::Vec<Option<StateDef<D>>, S>,
    timed: heapless::Vec<Option<TimedEdge<D>>, S>,
    edges: heapless::Vec<Edge<D>, E>,
    labels: Option<LabelPair<'a>>,
}

impl<'a, D, const S: usize, const E: usize> GraphBuilder<'a, D, S, E> {
    /// # Errors
    /// `NoStates`/`NoTriggers` for zero counts, `TooManyStates`/`TooManyTriggers`
    /// when a count exceeds the capacity or the 8-bit id space.
    pub fn new(state_count: usize, trigger_count: usize) -> Result<Self, GraphError> {
        let max_states = S.min(MAX_IDS);
        if state_count == 0 {
            return Err(GraphError::NoStates);
        }
        if state_count > max_states {
            return Err(GraphError::TooManyStates {
                requested: state_count,
                max: max_states,
            });
        }
        if trigger_count == 0 {
            return Err(GraphError::NoTriggers);
        }
        if trigger_count > MAX_IDS {
            return Err(GraphError::TooManyTriggers {
                requested: trigger_count,
                max: MAX_IDS,
            });
        }

        let mut states = heapless::Vec::new();
        let mut timed = heapless::Vec::new();
        let too_many = GraphError::TooManyStates {
            requested: state_count,
            max: max_states,
        };
        states.resize(state_count, None).map_err(|()| too_many)?;
        timed.resize(state_count, None).map_err(|()| too_many)?;

        Ok(Self {
            state_count,
            trigger_count,
            states,
            timed,
            edges: heapless::Vec::new(),
            labels: None,
        })
    }

    /// Sizes a builder from two derived label enums and attaches their labels.
    ///
    /// # Errors
    /// Same as [`GraphBuilder::new`].
    pub fn for_labels<St: Labels, Tr: Labels>() -> Result<Self, GraphError> {
        let mut builder = Self::new(St::COUNT, Tr::COUNT)?;
        builder.labels(St::label_table(), Tr::label_table())?;
        Ok(builder)
    }

    /// Attaches names for states and triggers.
    ///
    /// # Errors
    /// [`GraphError::LabelMismatch`] when either table's count differs from the graph's.
    pub fn labels(
        &mut self,
        states: &'a (dyn LabelTable + Sync),
        triggers: &'a (dyn LabelTable + Sync),
    ) -> Result<&mut Self, GraphError> {
        check_count(LabelKind::State, self.state_count, states.label_count())?;
        check_count(
            LabelKind::Trigger,
            self.trigger_count,
            triggers.label_count(),
        )?;
        self.labels = Some((states, triggers));
        Ok(self)
    }

    /// Installs the hooks of state `id`, replacing any earlier definition.
    ///
    /// # Errors
    /// [`GraphError::UnknownState`] for ids outside the graph.
    pub fn state(
        &mut self,
        id: impl Into<StateId>,
        def: StateDef<D>,
    ) -> Result<&mut Self, GraphError> {
        let id = id.into();
        let slot = self
            .states
            .get_mut(id.index())
            .ok_or(GraphError::UnknownState(id))?;
        if slot.is_some() {
            fsm_trace!("[BUILD] replacing definition of state {}", id);
        }
        *slot = Some(def);
        Ok(self)
    }

    /// Adds `(from, trigger) -> to`. A second edge for the same `(from, trigger)`
    /// replaces the first.
    ///
    /// # Errors
    /// `UnknownState`/`UnknownTrigger` for ids outside the graph,
    /// [`GraphError::TooManyEdges`] when the edge table is full.
    pub fn transition(
        &mut self,
        from: impl Into<StateId>,
        to: impl Into<StateId>,
        trigger: impl Into<TriggerId>,
        on_transition: Option<ActionFn<D>>,
    ) -> Result<&mut Self, GraphError> {
        let (from, to, trigger) = (from.into(), to.into(), trigger.into());
        self.check_state(from)?;
        self.check_state(to)?;
        if trigger.index() >= self.trigger_count {
            return Err(GraphError::UnknownTrigger(trigger));
        }

        let edge = Edge {
            from,
            trigger,
            to,
            on_transition,
        };
        if let Some(existing) = self
            .edges
            .iter_mut()
            .find(|e| e.from == from && e.trigger == trigger)
        {
            fsm_trace!(
                "[BUILD] replacing edge {} --{}--> {} with {}",
                from,
                trigger,
                existing.to,
                to
            );
            *existing = edge;
            return Ok(self);
        }
        let full = GraphError::TooManyEdges { capacity: E };
        self.edges.push(edge).map_err(|_| full)?;
        Ok(self)
    }

    /// Adds a timed edge out of `from`. Each state has at most one; a later
    /// call replaces the earlier one.
    ///
    /// # Errors
    /// [`GraphError::UnknownState`] for ids outside the graph.
    pub fn timed_transition(
        &mut self,
        from: impl Into<StateId>,
        to: impl Into<StateId>,
        interval_ms: u32,
        on_transition: Option<ActionFn<D>>,
    ) -> Result<&mut Self, GraphError> {
        let (from, to) = (from.into(), to.into());
        self.check_state(to)?;
        let slot = self
            .timed
            .get_mut(from.index())
            .ok_or(GraphError::UnknownState(from))?;
        if slot.is_some() {
            fsm_trace!("[BUILD] replacing timed edge out of {}", from);
        }
        *slot = Some(TimedEdge {
            from,
            to,
            interval_ms,
            on_transition,
        });
        Ok(self)
    }

    /// Checks every state is defined and produces the immutable graph.
    ///
    /// # Errors
    /// [`GraphError::UnknownState`] for a bad `start`,
    /// [`GraphError::MissingState`] for the first state with no definition.
    pub fn finalize(
        self,
        start: impl Into<StateId>,
    ) -> Result<TransitionGraph<'a, D, S, E>, GraphError> {
        let start = start.into();
        self.check_state(start)?;

        let mut states = heapless::Vec::new();
        for (index, def) in self.states.iter().enumerate() {
            // `new` caps the state count at 255, so the cast is lossless.
            #[allow(clippy::cast_possible_truncation)]
            let def = def.ok_or(GraphError::MissingState(StateId(index as u8)))?;
            let too_many = GraphError::TooManyStates {
                requested: self.state_count,
                max: S,
            };
            states.push(def).map_err(|_| too_many)?;
        }

        Ok(TransitionGraph {
            trigger_count: self.trigger_count,
            states,
            timed: self.timed,
            edges: self.edges,
            labels: self.labels,
            start,
        })
    }

    fn check_state(&self, id: StateId) -> Result<(), GraphError> {
        if id.index() < self.state_count {
            Ok(())
        } else {
            Err(GraphError::UnknownState(id))
        }
    }
}

fn check_count(kind: LabelKind, expected: usize, found: usize) -> Result<(), GraphError> {
    if expected == found {
        Ok(())
    } else {
        Err(GraphError::LabelMismatch {
            kind,
            expected,
            found,
        })
    }
}

/// A finalized, read-only machine definition.
///
/// Callbacks are plain `fn` pointers, so a graph is `Sync` whatever `D` is and
/// can live in a `static` shared by every instance.
pub struct TransitionGraph<
    'a,
    D,
    const S: usize = DEFAULT_MAX_STATES,
    const E: usize = DEFAULT_MAX_EDGES,
> {
    trigger_count: usize,
    states: heapless::Vec<StateDef<D>, S>,
    timed: heapless::Vec<Option<TimedEdge<D>>, S>,
    edges: heapless::Vec<Edge<D>, E>,
    labels: Option<LabelPair<'a>>,
    start: StateId,
}

impl<'a, D, const S: usize, const E: usize> TransitionGraph<'a, D, S, E> {
    #[must_use]
    pub fn start(&self) -> StateId {
        self.start
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.trigger_count
    }

    #[must_use]
    pub fn state_def(&self, id: StateId) -> Option<&StateDef<D>> {
        self.states.get(id.index())
    }

    /// The edge for `(from, trigger)`, if any.
    #[must_use]
    pub fn edge(&self, from: StateId, trigger: TriggerId) -> Option<&Edge<D>> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.trigger == trigger)
    }

    #[must_use]
    pub fn timed_edge(&self, from: StateId) -> Option<&TimedEdge<D>> {
        self.timed.get(from.index()).and_then(Option::as_ref)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<D>> {
        self.edges.iter()
    }

    pub fn timed_edges(&self) -> impl Iterator<Item = &TimedEdge<D>> {
        self.timed.iter().flatten()
    }

    #[must_use]
    pub fn state_label(&self, id: StateId) -> Label<'a> {
        Label::new(
            self.labels.map(|(states, _)| states),
            LabelKind::State,
            id.index(),
        )
    }

    #[must_use]
    pub fn trigger_label(&self, id: TriggerId) -> Label<'a> {
        Label::new(
            self.labels.map(|(_, triggers)| triggers),
            LabelKind::Trigger,
            id.index(),
        )
    }

    #[must_use]
    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }
}

impl<D, const S: usize, const E: usize> fmt::Debug for TransitionGraph<'_, D, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionGraph")
            .field("start", &self.start)
            .field("states", &self.states)
            .field("trigger_count", &self.trigger_count)
            .field("edges", &self.edges)
            .field("timed", &self.timed)
            .field("has_labels", &self.labels.is_some())
            .finish()
    }
}
