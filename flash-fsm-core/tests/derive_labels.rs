//! Derived label enums against hand-written packed tables.

use flash_fsm_core::{
    GraphBuilder, GraphError, LabelKind, Labels, StateDef, StateId, States, StringTable,
    TransitionGraph, TriggerId, Triggers, packed_strings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
enum Signal {
    Red,
    #[label = "Red+Amber"]
    RedAmber,
    Green,
    Amber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Triggers)]
enum Input {
    #[label = "button"]
    Button,
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
enum Discriminated {
    High = 10,
    Low = 3,
}

#[test]
fn packed_bytes_match_a_hand_written_table() {
    const HAND: &[u8] = packed_strings!("Red", "Red+Amber", "Green", "Amber");
    assert_eq!(Signal::PACKED, HAND);
    assert_eq!(Input::PACKED, b"button\0Fault\0\0");
    assert_eq!(Signal::COUNT, 4);
    assert_eq!(Signal::KIND, LabelKind::State);
    assert_eq!(Input::KIND, LabelKind::Trigger);
}

#[test]
fn parsed_table_agrees_with_name() {
    let table: StringTable<'static> = Signal::table().unwrap();
    for (index, entry) in table.iter().enumerate() {
        let signal = Signal::from_index(index as u8).unwrap();
        assert_eq!(entry, signal.name());
        assert_eq!(usize::from(signal.index()), index);
    }
}

#[test]
fn ids_convert_both_ways() {
    assert_eq!(StateId::from(Signal::Green), StateId(2));
    assert_eq!(TriggerId::from(Input::Fault), TriggerId(1));
    assert_eq!(Signal::try_from(StateId(1)), Ok(Signal::RedAmber));
    assert_eq!(Signal::try_from(StateId(4)), Err(StateId(4)));
    assert_eq!(Input::try_from(TriggerId(0)), Ok(Input::Button));
}

#[test]
fn index_follows_declaration_order_not_discriminants() {
    assert_eq!(Discriminated::High.index(), 0);
    assert_eq!(Discriminated::Low.index(), 1);
    assert_eq!(Discriminated::from_index(1), Some(Discriminated::Low));
    assert_eq!(Discriminated::from_index(2), None);
}

#[test]
fn builders_size_themselves_from_label_enums() -> Result<(), GraphError> {
    let mut builder: GraphBuilder<'_, ()> = GraphBuilder::for_labels::<Signal, Input>()?;
    for signal in [Signal::Red, Signal::RedAmber, Signal::Green, Signal::Amber] {
        builder.state(signal, StateDef::empty())?;
    }
    builder.transition(Signal::Red, Signal::RedAmber, Input::Button, None)?;
    let graph: TransitionGraph<'_, ()> = builder.finalize(Signal::Red)?;

    assert_eq!(graph.state_count(), 4);
    assert_eq!(graph.trigger_count(), 2);
    let red_amber = graph.state_label(Signal::RedAmber.into());
    assert_eq!(red_amber.to_string(), "Red+Amber");
    let button = graph.trigger_label(Input::Button.into());
    assert_eq!(button.to_string(), "button");
    Ok(())
}

#[test]
fn mismatched_label_enums_are_rejected() {
    let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(3, 2).unwrap();
    let err = builder
        .labels(Signal::label_table(), Input::label_table())
        .err();
    assert_eq!(
        err,
        Some(GraphError::LabelMismatch {
            kind: LabelKind::State,
            expected: 3,
            found: 4,
        })
    );
}
