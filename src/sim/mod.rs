//! Several crossings on one shared graph, ticked by the async driver.

mod config;
mod signal;

pub use config::{ConfigError, MAX_INSTANCES, SimConfig};
pub use signal::{AMBER_MS, Crossing, GREEN_MS, Input, RED_AMBER_MS, RED_MS, Signal, signal_graph};

use flash_fsm_core::timer::{TimerService, drive};
use flash_fsm_core::{Clock, Labels, Machine, Millis, Tick, TransitionGraph, TriggerOutcome};
use tokio::time::Instant;

/// Milliseconds since creation on tokio's clock, so paused-time tests and
/// the real binary see the same timeline.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Millis {
        // Wraps like a 32-bit hardware counter.
        Millis(self.origin.elapsed().as_millis() as u32)
    }
}

/// Final state of one crossing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingReport {
    pub signal: Signal,
    pub crossing: Crossing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub rounds: u32,
    /// Rounds in which at least one crossing changed phase.
    pub busy_rounds: u32,
    pub crossings: Vec<CrossingReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Button,
    Fault,
}

type CrossingMachine<'g, 'c, K> = Machine<'g, Crossing, &'c K>;

/// Runs `config.ticks` rounds over `config.instances` crossings.
///
/// The button goes to the first crossing, the fault to the last.
pub async fn run<T: TimerService, K: Clock>(
    graph: &TransitionGraph<'_, Crossing>,
    config: &SimConfig,
    clock: &K,
) -> Result<SimReport, ConfigError> {
    config.validate()?;

    let mut crossings: Vec<CrossingMachine<'_, '_, K>> = (0..config.instances)
        .map(|id| Machine::begin(graph, Crossing::new(id), clock))
        .collect();

    let mut schedule: Vec<(u32, Event)> = [
        config.button_at.map(|at| (at, Event::Button)),
        config.fault_at.map(|at| (at, Event::Fault)),
    ]
    .into_iter()
    .flatten()
    .collect();
    schedule.sort_by_key(|&(at, _)| at);

    let mut done = 0;
    let mut busy_rounds = 0;
    for (at, event) in schedule {
        busy_rounds += rounds::<T, K>(&mut crossings, config, at - done).await;
        done = at;
        inject(&mut crossings, event);
    }
    let remaining = config.ticks - done;
    busy_rounds += rounds::<T, K>(&mut crossings, config, remaining).await;

    let crossings = crossings
        .into_iter()
        .map(|machine| CrossingReport {
            signal: machine.state_as::<Signal>().unwrap_or(Signal::Red),
            crossing: machine.into_parts().0.into_data(),
        })
        .collect();
    Ok(SimReport {
        rounds: config.ticks,
        busy_rounds,
        crossings,
    })
}

async fn rounds<T: TimerService, K: Clock>(
    crossings: &mut [CrossingMachine<'_, '_, K>],
    config: &SimConfig,
    count: u32,
) -> u32 {
    if count == 0 {
        return 0;
    }
    let mut machines: Vec<&mut dyn Tick> = crossings
        .iter_mut()
        .map(|machine| machine as &mut dyn Tick)
        .collect();
    let period = config.period();
    drive::<T>(&mut machines, period, Some(count)).await
}

fn inject<K: Clock>(crossings: &mut [CrossingMachine<'_, '_, K>], event: Event) {
    match event {
        Event::Button => {
            if let Some(first) = crossings.first_mut() {
                first.data_mut().waiting = true;
                tracing::info!(crossing = first.data().id, "button pressed");
            }
        }
        Event::Fault => {
            if let Some(last) = crossings.last_mut() {
                let outcome = last.trigger(Input::Fault, true);
                if outcome == TriggerOutcome::NoMatch {
                    tracing::debug!(crossing = last.data().id, "already flashing");
                }
            }
        }
    }
}

/// One line per crossing, for the end-of-run summary.
pub fn summarize(report: &SimReport) -> Vec<String> {
    report
        .crossings
        .iter()
        .map(|c| {
            format!(
                "crossing {}: {} after {} cycles, {} requests served",
                c.crossing.id,
                c.signal.name(),
                c.crossing.cycles,
                c.crossing.requests_served
            )
        })
        .collect()
}
