//! Performance benchmarks for flash-fsm
//!
//! Criterion benches for packed table parsing and the per-tick cost of the
//! step protocol. Fixtures live here so the benches and their sanity tests
//! share them.

pub mod fixtures;

pub use fixtures::{Phase, Pulse, label_bytes, phase_graph, ring_graph};

#[cfg(test)]
mod tests {
    use super::*;
    use flash_fsm_core::{ExecutionContext, Millis, StateId, StringTable, TriggerId};

    #[test]
    fn label_fixture_parses() {
        let bytes = label_bytes(16);
        let table: StringTable<'_> = StringTable::parse(bytes.as_slice()).unwrap();
        assert_eq!(table.len(), 16);
        assert_eq!(table.get(15).unwrap(), "label-15");
    }

    #[test]
    fn ring_graph_cycles() {
        let graph = ring_graph(4).unwrap();
        let mut ctx = ExecutionContext::new(&graph, 0u32, Millis(0));
        for _ in 0..4 {
            ctx.trigger(TriggerId(0), true, Millis(0));
        }
        assert_eq!(ctx.current_state(), StateId(0));
        assert_eq!(*ctx.data(), 5);
    }

    #[test]
    fn phase_graph_advances_on_time() {
        let graph = phase_graph().unwrap();
        let mut ctx = ExecutionContext::new(&graph, 0u32, Millis(0));
        ctx.step(Millis(1));
        assert_eq!(Phase::try_from(ctx.current_state()), Ok(Phase::Rise));
    }
}
