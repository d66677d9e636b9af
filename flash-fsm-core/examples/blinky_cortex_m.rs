#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod cortex_m_logic {
    use cortex_m::asm;
    use cortex_m_rt::entry;
    use panic_halt as _;
    use static_cell::StaticCell;

    use flash_fsm_core::{
        GraphBuilder, GraphError, Machine, ManualClock, Scope, StateDef, States, TransitionGraph,
        TriggerId, Triggers,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq, States)]
    enum Led {
        Off,
        On,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Triggers)]
    enum Blink {
        Toggle,
    }

    #[derive(Default)]
    struct Blinker {
        on_ticks: u32,
        flashes: u32,
    }

    // One graph in flash-backed static storage, shared by both LEDs.
    static GRAPH: StaticCell<TransitionGraph<'static, Blinker>> = StaticCell::new();

    fn hold_on(scope: &mut Scope<'_, Blinker>) -> Option<TriggerId> {
        let data = scope.data_mut();
        data.on_ticks += 1;
        (data.on_ticks >= 200).then_some(Blink::Toggle.into())
    }

    fn count_flash(scope: &mut Scope<'_, Blinker>) {
        let data = scope.data_mut();
        data.on_ticks = 0;
        data.flashes += 1;
    }

    fn build() -> Result<TransitionGraph<'static, Blinker>, GraphError> {
        let mut builder = GraphBuilder::for_labels::<Led, Blink>()?;
        builder
            .state(Led::Off, StateDef::empty())?
            .state(Led::On, StateDef::empty().step(hold_on))?
            .timed_transition(Led::Off, Led::On, 500, None)?
            .transition(Led::On, Led::Off, Blink::Toggle, Some(count_flash))?;
        builder.finalize(Led::Off)
    }

    #[entry]
    fn main_cortex_m_entry() -> ! {
        let Ok(graph) = build() else {
            loop {
                asm::bkpt();
            }
        };
        let graph: &'static TransitionGraph<'static, Blinker> = GRAPH.init(graph);

        // One loop iteration stands in for one millisecond.
        let clock = ManualClock::new(0);
        let mut left = Machine::begin(graph, Blinker::default(), &clock);
        let mut right = Machine::begin(graph, Blinker::default(), &clock);
        right.trigger(Blink::Toggle, true);

        loop {
            clock.advance(1);
            left.run();
            right.run();
            let _ = (left.state_as::<Led>(), right.data().flashes);
            asm::nop();
        }
    }
}

// Dummy main for non-ARM targets.
#[cfg(not(target_arch = "arm"))]
fn main() {
    println!("This blinky_cortex_m example is intended for target_arch = \"arm\".");
}
