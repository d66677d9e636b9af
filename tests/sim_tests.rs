use flash_fsm::sim::{self, AMBER_MS, GREEN_MS, RED_AMBER_MS, RED_MS, SimConfig, TokioClock};
use flash_fsm::{ConfigError, Signal};
use flash_fsm_core::timer::TokioTimer;

const CYCLE_MS: u32 = RED_MS + RED_AMBER_MS + GREEN_MS + AMBER_MS;

fn config(instances: u32, ticks: u32) -> SimConfig {
    SimConfig {
        instances,
        ticks,
        tick_ms: 10,
        ..SimConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn crossings_without_events_stay_in_lockstep() {
    let graph = sim::signal_graph().unwrap();
    let clock = TokioClock::new();
    let ticks = CYCLE_MS / 10 + 1;
    let report = sim::run::<TokioTimer, _>(&graph, &config(3, ticks), &clock)
        .await
        .unwrap();

    assert_eq!(report.rounds, ticks);
    assert_eq!(report.crossings.len(), 3);
    for crossing in &report.crossings {
        assert_eq!(crossing.crossing.cycles, 1);
        assert_eq!(crossing.signal, Signal::Red);
    }
    // One busy round per phase change.
    assert_eq!(report.busy_rounds, 4);
}

#[tokio::test(start_paused = true)]
async fn button_only_affects_the_first_crossing() {
    let graph = sim::signal_graph().unwrap();
    let clock = TokioClock::new();
    // Press during the first green, run until just after the request is served.
    let green_at = (RED_MS + RED_AMBER_MS) / 10;
    let settings = SimConfig {
        button_at: Some(green_at + 5),
        ..config(2, green_at + 10)
    };
    let report = sim::run::<TokioTimer, _>(&graph, &settings, &clock)
        .await
        .unwrap();

    let first = &report.crossings[0];
    let second = &report.crossings[1];
    assert_eq!(first.crossing.requests_served, 1);
    assert_eq!(first.signal, Signal::Amber);
    assert_eq!(second.crossing.requests_served, 0);
    assert_eq!(second.signal, Signal::Green);
}

#[tokio::test(start_paused = true)]
async fn fault_sends_the_last_crossing_flashing() {
    let graph = sim::signal_graph().unwrap();
    let clock = TokioClock::new();
    let settings = SimConfig {
        fault_at: Some(20),
        ..config(3, 40)
    };
    let report = sim::run::<TokioTimer, _>(&graph, &settings, &clock)
        .await
        .unwrap();

    let last = report.crossings.last().unwrap();
    assert_eq!(last.signal, Signal::Flashing);
    assert_eq!(last.crossing.flashes, 20);
    let others = &report.crossings[..2];
    assert!(others.iter().all(|c| c.signal == Signal::Red));

    let lines = sim::summarize(&report);
    assert_eq!(
        lines[2],
        "crossing 2: Flashing Amber after 0 cycles, 0 requests served"
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_settings_are_rejected_before_running() {
    let graph = sim::signal_graph().unwrap();
    let clock = TokioClock::new();
    let err = sim::run::<TokioTimer, _>(&graph, &config(0, 10), &clock)
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::NoInstances);

    let settings = SimConfig {
        tick_ms: 0,
        ..config(1, 10)
    };
    let err = sim::run::<TokioTimer, _>(&graph, &settings, &clock)
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::ZeroTickPeriod);
}

#[test]
fn dumped_graph_names_every_phase() {
    let graph = sim::signal_graph().unwrap();
    let json = serde_json::to_value(graph.describe()).unwrap();
    let states: Vec<&str> = json["states"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(
        states,
        ["Red", "Red+Amber", "Green", "Amber", "Flashing Amber"]
    );
    assert_eq!(json["start"], "Red");
    assert_eq!(json["timed"].as_array().unwrap().len(), 4);
}
