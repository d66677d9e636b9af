//! The async tick driver on the tokio runtime, with paused time.

use crate::common::*;
use flash_fsm_core::timer::{TokioTimer, drive};
use flash_fsm_core::{
    Clock, GraphBuilder, Machine, Millis, Scope, StateDef, StateId, Tick, TransitionGraph,
};
use tokio::time::{Duration, Instant, timeout};

/// Milliseconds on tokio's clock, which `start_paused` makes deterministic.
struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Millis {
        let elapsed = self.origin.elapsed().as_millis();
        Millis(u32::try_from(elapsed).unwrap_or(u32::MAX))
    }
}

fn count_entry(scope: &mut Scope<'_, u32>) {
    *scope.data_mut() += 1;
}

fn count_step(scope: &mut Scope<'_, u32>) -> Option<flash_fsm_core::TriggerId> {
    *scope.data_mut() += 1;
    None
}

/// `A -> B -> A`, each after 20ms.
fn timed_blinker() -> TransitionGraph<'static, u32> {
    let mut builder: GraphBuilder<'_, u32> = GraphBuilder::new(2, 1).unwrap();
    builder
        .state(StateId(0), StateDef::empty().enter(count_entry))
        .unwrap()
        .state(StateId(1), StateDef::empty().enter(count_entry))
        .unwrap()
        .timed_transition(StateId(0), StateId(1), 20, None)
        .unwrap()
        .timed_transition(StateId(1), StateId(0), 20, None)
        .unwrap();
    builder.finalize(StateId(0)).unwrap()
}

fn step_counter() -> TransitionGraph<'static, u32> {
    let mut builder: GraphBuilder<'_, u32> = GraphBuilder::new(1, 1).unwrap();
    builder.state(StateId(0), StateDef::empty().step(count_step)).unwrap();
    builder.finalize(StateId(0)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn drive_fires_timed_edges_on_schedule() {
    setup_tracing();
    let graph = timed_blinker();
    let clock = TokioClock::new();
    let started = Instant::now();
    let mut blinker = Machine::begin(&graph, 0u32, &clock);

    let busy = {
        let mut machines: [&mut dyn Tick; 1] = [&mut blinker];
        let period = Duration::from_millis(10);
        drive::<TokioTimer>(&mut machines, period, Some(5)).await
    };

    assert_eq!(busy, 2);
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(blinker.current_state(), StateId(0));
    // Start state plus two timed entries.
    assert_eq!(*blinker.data(), 3);
}

#[tokio::test(start_paused = true)]
async fn machines_with_different_data_share_one_driver() {
    setup_tracing();
    let ab = ab_graph().unwrap();
    let blinker_graph = timed_blinker();
    let clock = TokioClock::new();
    let mut recorder = Machine::begin(&ab, Recorder::new(7), &clock);
    let mut blinker = Machine::begin(&blinker_graph, 0u32, &clock);

    {
        let mut machines: [&mut dyn Tick; 2] = [&mut recorder, &mut blinker];
        let period = Duration::from_millis(10);
        drive::<TokioTimer>(&mut machines, period, Some(12)).await;
    }

    assert_eq!(recorder.state_as::<TestState>(), Some(TestState::B));
    assert_eq!(
        recorder.data().calls,
        [
            Call::Enter(TestState::A),
            Call::Exit(TestState::A),
            Call::TimerAction,
            Call::Enter(TestState::B),
        ]
    );
    // 120ms of 20ms blinks.
    assert_eq!(*blinker.data(), 1 + 6);
}

#[tokio::test(start_paused = true)]
async fn unbounded_drive_runs_until_cancelled() {
    let graph = step_counter();
    let clock = TokioClock::new();
    let mut counter = Machine::begin(&graph, 0u32, &clock);

    {
        let mut machines: [&mut dyn Tick; 1] = [&mut counter];
        let run = drive::<TokioTimer>(&mut machines, Duration::from_millis(10), None);
        let cancelled = timeout(Duration::from_millis(35), run).await;
        assert!(cancelled.is_err());
    }

    assert_eq!(*counter.data(), 3);
}
