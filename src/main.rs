use anyhow::{Context, Result};
use clap::Parser;
use flash_fsm::sim::{self, SimConfig, TokioClock};
use flash_fsm_core::timer::TokioTimer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Reads RUST_LOG, e.g. RUST_LOG=flash_fsm=debug,flash_fsm_core=trace
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = SimConfig::parse();
    let graph = sim::signal_graph().context("building the signal graph")?;

    if config.dump_graph {
        let json = serde_json::to_string_pretty(&graph.describe())?;
        println!("{json}");
        return Ok(());
    }

    tracing::info!(
        instances = config.instances,
        ticks = config.ticks,
        tick_ms = config.tick_ms,
        "starting simulation"
    );
    let clock = TokioClock::new();
    let report = sim::run::<TokioTimer, _>(&graph, &config, &clock)
        .await
        .context("invalid simulation settings")?;

    for line in sim::summarize(&report) {
        tracing::info!("{line}");
    }
    tracing::info!(
        rounds = report.rounds,
        busy_rounds = report.busy_rounds,
        "simulation finished"
    );
    Ok(())
}
