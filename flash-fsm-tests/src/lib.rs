//! Integration and property tests for flash-fsm
//!
//! This crate contains tests that require std features and heavy
//! dependencies that shouldn't be part of the core `no_std` build.

#![cfg(test)]

#[cfg(feature = "async-tokio")]
pub mod async_tests;
pub mod integration;

/// Common test utilities and fixtures
pub mod common {
    use flash_fsm_core::{
        GraphBuilder, GraphError, Scope, StateDef, States, TransitionGraph, TriggerId, Triggers,
    };

    /// Setup tracing for tests
    pub fn setup_tracing() {
        use tracing_subscriber::{EnvFilter, fmt};

        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
    pub enum TestState {
        A,
        B,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Triggers)]
    pub enum TestTrigger {
        Go,
        Back,
    }

    /// One recorded hook invocation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Call {
        Enter(TestState),
        Exit(TestState),
        GoAction,
        TimerAction,
    }

    /// Per-instance data: which instance this is and what ran.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub instance: u32,
        pub calls: Vec<Call>,
    }

    impl Recorder {
        pub fn new(instance: u32) -> Self {
            Self {
                instance,
                calls: Vec::new(),
            }
        }
    }

    fn state_of(scope: &Scope<'_, Recorder>) -> TestState {
        TestState::try_from(scope.state()).unwrap_or(TestState::A)
    }

    fn on_enter(scope: &mut Scope<'_, Recorder>) {
        let state = state_of(scope);
        tracing::trace!(instance = scope.data().instance, ?state, "enter");
        scope.data_mut().calls.push(Call::Enter(state));
    }

    fn on_exit(scope: &mut Scope<'_, Recorder>) {
        let state = state_of(scope);
        scope.data_mut().calls.push(Call::Exit(state));
    }

    fn go_action(scope: &mut Scope<'_, Recorder>) {
        scope.data_mut().calls.push(Call::GoAction);
    }

    fn timer_action(scope: &mut Scope<'_, Recorder>) {
        scope.data_mut().calls.push(Call::TimerAction);
    }

    fn recorded() -> StateDef<Recorder> {
        StateDef::empty().enter(on_enter).exit(on_exit)
    }

    /// States `{A, B}`, trigger `Go`, edge `(A, Go) -> B`, timed edge
    /// `A -> B after 100ms`, and `(B, Back) -> A`.
    pub fn ab_graph() -> Result<TransitionGraph<'static, Recorder>, GraphError> {
        let mut builder = GraphBuilder::for_labels::<TestState, TestTrigger>()?;
        builder
            .state(TestState::A, recorded())?
            .state(TestState::B, recorded())?
            .transition(TestState::A, TestState::B, TestTrigger::Go, Some(go_action))?
            .transition(TestState::B, TestState::A, TestTrigger::Back, None)?
            .timed_transition(TestState::A, TestState::B, 100, Some(timer_action))?;
        builder.finalize(TestState::A)
    }

    pub fn go() -> TriggerId {
        TestTrigger::Go.into()
    }
}
