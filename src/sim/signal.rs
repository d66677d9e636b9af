//! The traffic-signal graph shared by every crossing.

use flash_fsm_core::{
    GraphBuilder, GraphError, Labels, Scope, StateDef, States, TransitionGraph, TriggerId,
    Triggers,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
pub enum Signal {
    Red,
    #[label = "Red+Amber"]
    RedAmber,
    Green,
    Amber,
    #[label = "Flashing Amber"]
    Flashing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Triggers)]
pub enum Input {
    /// Pedestrian request; ends green early.
    Button,
    /// Lamp failure; any running phase drops to flashing amber.
    Fault,
    /// Maintenance reset out of flashing amber.
    Reset,
}

/// Phase lengths in milliseconds.
pub const RED_MS: u32 = 2_000;
pub const RED_AMBER_MS: u32 = 500;
pub const GREEN_MS: u32 = 2_000;
pub const AMBER_MS: u32 = 800;

/// Per-crossing data; the graph itself holds none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crossing {
    pub id: u32,
    /// A pedestrian is waiting for the next green to end.
    pub waiting: bool,
    /// Completed Red..Amber cycles.
    pub cycles: u32,
    /// Greens cut short by the button.
    pub requests_served: u32,
    /// Lamp state while flashing.
    pub lamp_on: bool,
    pub flashes: u32,
}

impl Crossing {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

fn signal_of(scope: &Scope<'_, Crossing>) -> &'static str {
    Signal::try_from(scope.state()).map_or("?", Signal::name)
}

fn announce(scope: &mut Scope<'_, Crossing>) {
    tracing::debug!(
        crossing = scope.data().id,
        signal = signal_of(scope),
        at = %scope.now(),
        "phase"
    );
}

fn green_step(scope: &mut Scope<'_, Crossing>) -> Option<TriggerId> {
    scope.data().waiting.then(|| Input::Button.into())
}

fn serve_request(scope: &mut Scope<'_, Crossing>) {
    let crossing = scope.data_mut();
    crossing.waiting = false;
    crossing.requests_served += 1;
    tracing::info!(crossing = crossing.id, "pedestrian request served");
}

fn count_cycle(scope: &mut Scope<'_, Crossing>) {
    scope.data_mut().cycles += 1;
}

fn enter_flashing(scope: &mut Scope<'_, Crossing>) {
    let crossing = scope.data_mut();
    crossing.lamp_on = true;
    tracing::warn!(crossing = crossing.id, "lamp fault, flashing amber");
}

fn flash_step(scope: &mut Scope<'_, Crossing>) -> Option<TriggerId> {
    let crossing = scope.data_mut();
    crossing.lamp_on = !crossing.lamp_on;
    crossing.flashes += 1;
    None
}

fn leave_flashing(scope: &mut Scope<'_, Crossing>) {
    scope.data_mut().lamp_on = false;
}

/// Builds the signal graph:
///
/// ```text
/// Red -2000ms-> Red+Amber -500ms-> Green -2000ms-> Amber -800ms-> Red
///                                  Green -Button-> Amber
/// {Red, Red+Amber, Green, Amber} -Fault-> Flashing -Reset-> Red
/// ```
pub fn signal_graph() -> Result<TransitionGraph<'static, Crossing>, GraphError> {
    let mut builder = GraphBuilder::for_labels::<Signal, Input>()?;
    let running = StateDef::empty().enter(announce);
    builder
        .state(Signal::Red, running)?
        .state(Signal::RedAmber, running)?
        .state(Signal::Green, running.step(green_step))?
        .state(Signal::Amber, running)?
        .state(
            Signal::Flashing,
            StateDef::empty()
                .enter(enter_flashing)
                .step(flash_step)
                .exit(leave_flashing),
        )?
        .timed_transition(Signal::Red, Signal::RedAmber, RED_MS, None)?
        .timed_transition(Signal::RedAmber, Signal::Green, RED_AMBER_MS, None)?
        .timed_transition(Signal::Green, Signal::Amber, GREEN_MS, None)?
        .timed_transition(Signal::Amber, Signal::Red, AMBER_MS, Some(count_cycle))?
        .transition(
            Signal::Green,
            Signal::Amber,
            Input::Button,
            Some(serve_request),
        )?
        .transition(Signal::Flashing, Signal::Red, Input::Reset, None)?;
    for phase in [Signal::Red, Signal::RedAmber, Signal::Green, Signal::Amber] {
        builder.transition(phase, Signal::Flashing, Input::Fault, None)?;
    }
    builder.finalize(Signal::Red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flash_fsm_core::{ExecutionContext, Millis, StateId};

    fn at(ctx: &ExecutionContext<'_, Crossing>) -> Signal {
        Signal::try_from(ctx.current_state()).unwrap()
    }

    #[test]
    fn phases_follow_their_timers() {
        let graph = signal_graph().unwrap();
        let mut ctx = ExecutionContext::new(&graph, Crossing::new(0), Millis(0));
        let mut now = 0;
        for (expected, after) in [
            (Signal::RedAmber, RED_MS),
            (Signal::Green, RED_AMBER_MS),
            (Signal::Amber, GREEN_MS),
            (Signal::Red, AMBER_MS),
        ] {
            now += after;
            ctx.step(Millis(now - 1));
            assert_ne!(at(&ctx), expected);
            ctx.step(Millis(now));
            assert_eq!(at(&ctx), expected);
        }
        assert_eq!(ctx.data().cycles, 1);
    }

    #[test]
    fn waiting_pedestrian_ends_green_on_the_next_step() {
        let graph = signal_graph().unwrap();
        let mut ctx = ExecutionContext::new(&graph, Crossing::new(0), Millis(0));
        ctx.step(Millis(RED_MS));
        ctx.step(Millis(RED_MS + RED_AMBER_MS));
        assert_eq!(at(&ctx), Signal::Green);

        ctx.data_mut().waiting = true;
        let report = ctx.step(Millis(RED_MS + RED_AMBER_MS + 10));
        assert_eq!(report.requested, Some(Input::Button.into()));
        ctx.step(Millis(RED_MS + RED_AMBER_MS + 20));
        assert_eq!(at(&ctx), Signal::Amber);
        assert!(!ctx.data().waiting);
        assert_eq!(ctx.data().requests_served, 1);
    }

    #[test]
    fn fault_and_reset() {
        let graph = signal_graph().unwrap();
        let mut ctx = ExecutionContext::new(&graph, Crossing::new(3), Millis(0));
        ctx.trigger(Input::Fault, true, Millis(5));
        assert_eq!(at(&ctx), Signal::Flashing);
        assert_eq!(ctx.to_string(), "Flashing Amber");

        ctx.step(Millis(10));
        ctx.step(Millis(20));
        assert_eq!(ctx.data().flashes, 2);
        assert!(ctx.data().lamp_on);

        ctx.trigger(Input::Reset, true, Millis(30));
        assert_eq!(ctx.current_state(), StateId::from(Signal::Red));
        assert!(!ctx.data().lamp_on);
    }
}
