//! End-to-end scenarios against the public API.

use crate::common::*;
use flash_fsm_core::{
    Cause, ExecutionContext, GraphBuilder, GraphError, LabelKind, Machine, ManualClock, Millis,
    ProgMem, StateDef, StateId, StateMachine, StringTable, TableError, Tick, Transition,
    TriggerId, TriggerOutcome, packed_strings, static_string_table,
};

#[test]
fn three_segment_table_scenario() -> anyhow::Result<()> {
    let table: StringTable<'_> = StringTable::parse(b"1\0second\0third\0\0")?;
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(1)?, "second");
    assert_eq!(table.to_string(), "1, second, third");
    assert_eq!(
        table.get(3).unwrap_err(),
        TableError::IndexOutOfRange { index: 3, len: 3 }
    );
    Ok(())
}

#[test]
fn zero_segment_table_fails() {
    let err: Result<StringTable<'_>, _> = StringTable::parse(b"\0\0");
    assert_eq!(err.err(), Some(TableError::Empty));
}

#[test]
fn static_tables_live_for_the_program() -> anyhow::Result<()> {
    let table = static_string_table!(MENU, packed_strings!("Start", "Settings", "About"), 4)?;
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(2)?.to_string(), "About");
    Ok(())
}

fn trigger_labels() -> Result<&'static StringTable<'static, 2>, TableError> {
    static_string_table!(AB_TRIGGERS, packed_strings!("Go", "Back"), 2)
}

#[test]
fn every_instance_shares_one_static_table() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let mut tables = Vec::new();
    for instance in 0..3 {
        let mut ctx = ExecutionContext::new(&graph, Recorder::new(instance), Millis(0));
        let labels = trigger_labels()?;
        ctx.trigger(go(), true, Millis(1));
        assert_eq!(ctx.current_state(), StateId::from(TestState::B));
        assert_eq!(labels.get(go().index())?, "Go");
        tables.push(labels);
    }
    assert!(tables.iter().all(|t| std::ptr::eq(*t, tables[0])));
    Ok(())
}

#[test]
fn progmem_backed_labels_name_graph_states() -> anyhow::Result<()> {
    static STATE_BYTES: [u8; 8] = *b"Off\0On\0\0";
    static TRIGGER_BYTES: [u8; 8] = *b"Flip\0\0\0\0";
    let state_mem = ProgMem::new(&STATE_BYTES);
    let trigger_mem = ProgMem::new(&TRIGGER_BYTES);
    let states: flash_fsm_core::PackedStringTable<'_, ProgMem<'_>> =
        flash_fsm_core::PackedStringTable::parse(&state_mem)?;
    let triggers: flash_fsm_core::PackedStringTable<'_, ProgMem<'_>> =
        flash_fsm_core::PackedStringTable::parse(&trigger_mem)?;

    let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 1)?;
    builder
        .labels(&states, &triggers)?
        .state(StateId(0), StateDef::empty())?
        .state(StateId(1), StateDef::empty())?
        .transition(StateId(0), StateId(1), TriggerId(0), None)?;
    let graph = builder.finalize(StateId(0))?;

    let mut ctx = ExecutionContext::new(&graph, (), Millis(0));
    assert_eq!(ctx.to_string(), "Off");
    ctx.trigger(TriggerId(0), true, Millis(1));
    assert_eq!(ctx.to_string(), "On");
    Ok(())
}

#[test]
fn immediate_go_moves_without_timer_callbacks() -> anyhow::Result<()> {
    setup_tracing();
    let graph = ab_graph()?;
    let mut ctx = ExecutionContext::new(&graph, Recorder::new(0), Millis(0));

    let outcome = ctx.trigger(go(), true, Millis(10));
    assert_eq!(
        outcome,
        TriggerOutcome::Transitioned(Transition {
            from: TestState::A.into(),
            to: TestState::B.into(),
            cause: Cause::Trigger(go()),
        })
    );
    assert_eq!(
        ctx.data().calls,
        [
            Call::Enter(TestState::A),
            Call::Exit(TestState::A),
            Call::GoAction,
            Call::Enter(TestState::B),
        ]
    );
    assert!(!ctx.data().calls.contains(&Call::TimerAction));
    Ok(())
}

#[test]
fn timed_edge_fires_exactly_once() -> anyhow::Result<()> {
    setup_tracing();
    let graph = ab_graph()?;
    let mut ctx = ExecutionContext::new(&graph, Recorder::new(0), Millis(0));

    let mut timed = 0;
    for now in (0..=300).step_by(10) {
        let report = ctx.step(Millis(now));
        if let Some(transition) = report.timed {
            timed += 1;
            assert_eq!(now, 100);
            assert_eq!(transition.cause, Cause::Timer { after_ms: 100 });
        }
    }
    assert_eq!(timed, 1);
    assert_eq!(ctx.current_state(), StateId::from(TestState::B));
    let timer_actions = ctx
        .data()
        .calls
        .iter()
        .filter(|c| **c == Call::TimerAction)
        .count();
    assert_eq!(timer_actions, 1);
    Ok(())
}

#[test]
fn unmapped_trigger_leaves_everything_alone() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let mut ctx = ExecutionContext::new(&graph, Recorder::new(0), Millis(0));
    let before = ctx.data().calls.len();

    assert_eq!(
        ctx.trigger(TestTrigger::Back, true, Millis(5)),
        TriggerOutcome::NoMatch
    );
    assert_eq!(ctx.current_state(), StateId::from(TestState::A));
    assert_eq!(ctx.entered_at(), Millis(0));
    assert_eq!(ctx.data().calls.len(), before);
    Ok(())
}

#[test]
fn contexts_sharing_a_graph_stay_independent() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let mut first = ExecutionContext::new(&graph, Recorder::new(1), Millis(0));
    let mut second = ExecutionContext::new(&graph, Recorder::new(2), Millis(50));

    first.trigger(go(), false, Millis(0));
    first.step(Millis(1));
    second.step(Millis(60));

    assert_eq!(first.current_state(), StateId::from(TestState::B));
    assert_eq!(second.current_state(), StateId::from(TestState::A));
    assert_eq!(first.data().instance, 1);
    assert_eq!(second.data().calls, [Call::Enter(TestState::A)]);

    // Second instance's timer counts from its own entry time.
    second.step(Millis(149));
    assert_eq!(second.current_state(), StateId::from(TestState::A));
    second.step(Millis(150));
    assert_eq!(second.current_state(), StateId::from(TestState::B));
    Ok(())
}

#[test]
fn graphs_can_be_shared_across_threads() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let states: Vec<StateId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u32)
            .map(|instance| {
                let graph = &graph;
                scope.spawn(move || {
                    let mut ctx = ExecutionContext::new(graph, Recorder::new(instance), Millis(0));
                    if instance % 2 == 0 {
                        ctx.trigger(go(), true, Millis(1));
                    }
                    ctx.current_state()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let a = StateId::from(TestState::A);
    let b = StateId::from(TestState::B);
    assert_eq!(states, [b, a, b, a]);
    Ok(())
}

#[test]
fn last_deferred_trigger_wins() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let clock = ManualClock::new(0);
    let mut machine = Machine::begin(&graph, Recorder::new(0), &clock);

    assert_eq!(
        machine.trigger(TestTrigger::Back, false),
        TriggerOutcome::Queued { replaced: None }
    );
    assert_eq!(
        machine.trigger(TestTrigger::Go, false),
        TriggerOutcome::Queued {
            replaced: Some(TestTrigger::Back.into()),
        }
    );
    let report = machine.run();
    assert_eq!(report.consumed, Some(go()));
    assert_eq!(machine.state_as::<TestState>(), Some(TestState::B));
    assert_eq!(machine.to_string(), "B");
    Ok(())
}

#[test]
fn unknown_trigger_ids_are_reported() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let clock = ManualClock::new(0);
    let mut machine = Machine::begin(&graph, Recorder::new(0), &clock);
    assert_eq!(
        StateMachine::trigger(&mut machine, TriggerId(2), true),
        TriggerOutcome::Unknown
    );
    assert_eq!(machine.context().pending_trigger(), None);
    Ok(())
}

#[test]
fn heterogeneous_machines_tick_together() -> anyhow::Result<()> {
    let ab = ab_graph()?;
    let mut counter: GraphBuilder<'_, u64> = GraphBuilder::new(1, 1)?;
    counter.state(
        StateId(0),
        StateDef::empty().step(|scope| {
            *scope.data_mut() += 1;
            None
        }),
    )?;
    let counter = counter.finalize(StateId(0))?;

    let clock = ManualClock::new(0);
    let mut recorder = Machine::begin(&ab, Recorder::new(0), &clock);
    let mut ticks = Machine::begin(&counter, 0u64, &clock);
    {
        let mut machines: [&mut dyn Tick; 2] = [&mut recorder, &mut ticks];
        for _ in 0..3 {
            clock.advance(50);
            for machine in machines.iter_mut() {
                machine.tick();
            }
        }
    }
    assert_eq!(*ticks.data(), 3);
    assert_eq!(recorder.state_as::<TestState>(), Some(TestState::B));
    Ok(())
}

#[test]
fn label_mismatch_stops_construction() {
    let states: StringTable<'_> = StringTable::parse(packed_strings!("A", "B", "C")).unwrap();
    let triggers: StringTable<'_> = StringTable::parse(packed_strings!("Go", "Back")).unwrap();
    let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 2).unwrap();
    let err = builder.labels(&states, &triggers).err();
    assert_eq!(
        err,
        Some(GraphError::LabelMismatch {
            kind: LabelKind::State,
            expected: 2,
            found: 3,
        })
    );
    assert_eq!(
        err.map(|e| e.to_string()).as_deref(),
        Some("state labels: expected 2 entries, found 3")
    );
}

#[test]
fn timed_edges_survive_counter_wraparound() -> anyhow::Result<()> {
    let graph = ab_graph()?;
    let start = u32::MAX - 40;
    let mut ctx = ExecutionContext::new(&graph, Recorder::new(0), Millis(start));

    ctx.step(Millis(start.wrapping_add(99)));
    assert_eq!(ctx.current_state(), StateId::from(TestState::A));
    let report = ctx.step(Millis(start.wrapping_add(100)));
    assert_eq!(report.timed.map(|t| t.to), Some(TestState::B.into()));
    assert_eq!(ctx.entered_at(), Millis(59));
    Ok(())
}
