//! Serializable snapshot of a finalized graph, for tooling.

use serde::Serialize;

use crate::graph::{StateId, TransitionGraph, TriggerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDiagram {
    pub start: String,
    pub states: Vec<String>,
    pub triggers: Vec<String>,
    pub transitions: Vec<EdgeDiagram>,
    pub timed: Vec<TimedDiagram>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDiagram {
    pub from: String,
    pub trigger: String,
    pub to: String,
    pub has_action: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedDiagram {
    pub from: String,
    pub to: String,
    pub after_ms: u32,
    pub has_action: bool,
}

impl<D, const S: usize, const E: usize> TransitionGraph<'_, D, S, E> {
    /// Names every state, trigger and edge. Unlabeled graphs use `S<n>`/`T<n>`.
    #[must_use]
    pub fn describe(&self) -> GraphDiagram {
        let states = (0..self.state_count())
            .map(|i| self.state_label(StateId(id_of(i))).to_string())
            .collect();
        let triggers = (0..self.trigger_count())
            .map(|i| self.trigger_label(TriggerId(id_of(i))).to_string())
            .collect();
        let transitions = self
            .edges()
            .map(|edge| EdgeDiagram {
                from: self.state_label(edge.from).to_string(),
                trigger: self.trigger_label(edge.trigger).to_string(),
                to: self.state_label(edge.to).to_string(),
                has_action: edge.on_transition.is_some(),
            })
            .collect();
        let timed = self
            .timed_edges()
            .map(|edge| TimedDiagram {
                from: self.state_label(edge.from).to_string(),
                to: self.state_label(edge.to).to_string(),
                after_ms: edge.interval_ms,
                has_action: edge.on_transition.is_some(),
            })
            .collect();

        GraphDiagram {
            start: self.state_label(self.start()).to_string(),
            states,
            triggers,
            transitions,
            timed,
        }
    }
}

// Graph ids are capped at 255 by the builder.
#[allow(clippy::cast_possible_truncation)]
fn id_of(index: usize) -> u8 {
    index as u8
}

#[cfg(test)]
mod tests {
    use crate::graph::{GraphBuilder, StateDef, StateId, TriggerId};
    use crate::{Scope, StringTable};

    fn log(_: &mut Scope<'_, ()>) {}

    #[test]
    fn describes_labeled_graphs() {
        let states: StringTable<'_> = StringTable::parse(b"Off\0On\0\0").unwrap();
        let triggers: StringTable<'_> = StringTable::parse(b"Toggle\0\0").unwrap();
        let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 1).unwrap();
        builder.labels(&states, &triggers).unwrap();
        builder.state(StateId(0), StateDef::empty()).unwrap();
        builder.state(StateId(1), StateDef::empty()).unwrap();
        builder.transition(StateId(0), StateId(1), TriggerId(0), Some(log)).unwrap();
        builder.timed_transition(StateId(1), StateId(0), 250, None).unwrap();
        let graph = builder.finalize(StateId(0)).unwrap();

        let diagram = graph.describe();
        assert_eq!(diagram.start, "Off");
        assert_eq!(diagram.states, ["Off", "On"]);
        assert_eq!(diagram.triggers, ["Toggle"]);
        assert_eq!(diagram.transitions.len(), 1);
        assert!(diagram.transitions[0].has_action);
        assert_eq!(diagram.timed[0].after_ms, 250);

        let json = serde_json::to_value(&diagram).unwrap();
        assert_eq!(json["transitions"][0]["trigger"], "Toggle");
        assert_eq!(json["timed"][0]["to"], "Off");
    }

    #[test]
    fn unlabeled_graphs_fall_back_to_ids() {
        let mut builder: GraphBuilder<'_, ()> = GraphBuilder::new(2, 2).unwrap();
        builder.state(StateId(0), StateDef::empty()).unwrap();
        builder.state(StateId(1), StateDef::empty()).unwrap();
        builder.transition(StateId(1), StateId(0), TriggerId(1), None).unwrap();
        let graph = builder.finalize(StateId(1)).unwrap();

        let diagram = graph.describe();
        assert_eq!(diagram.start, "S1");
        assert_eq!(diagram.triggers, ["T0", "T1"]);
        assert_eq!(diagram.transitions[0].trigger, "T1");
        assert!(diagram.timed.is_empty());
    }
}
