//! Host walk-through of the low-level API: a hand-packed label table and an
//! `ExecutionContext` driven with explicit timestamps.

use flash_fsm_core::{
    ExecutionContext, GraphBuilder, GraphError, Millis, Scope, StateDef, StateId, StringTable,
    TransitionGraph, TriggerId, packed_strings,
};

const STATE_NAMES: &[u8] = packed_strings!("Red", "Green", "Yellow");
const TRIGGER_NAMES: &[u8] = packed_strings!("Walk");

const RED: StateId = StateId(0);
const GREEN: StateId = StateId(1);
const YELLOW: StateId = StateId(2);
const WALK: TriggerId = TriggerId(0);

#[derive(Debug, Default)]
struct Crossing {
    cycles: u32,
    walk_requests: u32,
}

fn count_cycle(scope: &mut Scope<'_, Crossing>) {
    scope.data_mut().cycles += 1;
    println!("[{}] red again, cycle {}", scope.now(), scope.data().cycles);
}

fn note_walk(scope: &mut Scope<'_, Crossing>) {
    scope.data_mut().walk_requests += 1;
}

fn build<'a>(
    states: &'a StringTable<'a>,
    triggers: &'a StringTable<'a>,
) -> Result<TransitionGraph<'a, Crossing>, GraphError> {
    let mut builder = GraphBuilder::new(3, 1)?;
    builder
        .labels(states, triggers)?
        .state(RED, StateDef::empty().enter(count_cycle))?
        .state(GREEN, StateDef::empty())?
        .state(YELLOW, StateDef::empty())?
        .timed_transition(RED, GREEN, 3_000, None)?
        .timed_transition(YELLOW, RED, 1_000, None)?
        // Green holds until somebody presses the button.
        .transition(GREEN, YELLOW, WALK, Some(note_walk))?;
    builder.finalize(RED)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let states: StringTable<'_> = StringTable::parse(STATE_NAMES)?;
    let triggers: StringTable<'_> = StringTable::parse(TRIGGER_NAMES)?;
    println!("states: {states}");

    let graph = build(&states, &triggers)?;
    let mut light = ExecutionContext::new(&graph, Crossing::default(), Millis(0));

    for tick in 0..=100u32 {
        let now = Millis(tick * 100);
        if tick % 45 == 0 && tick > 0 {
            light.trigger(WALK, false, now);
        }
        let report = light.step(now);
        if report.transitioned() {
            println!("[{now}] -> {light}");
        }
    }

    println!("{:?}", light.data());
    Ok(())
}
