use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::Command;

const HOST: &str = "x86_64-unknown-linux-gnu";
const CORTEX_M: &str = "thumbv7m-none-eabi";

/// Core feature sets that must each build on their own.
const FEATURE_MATRIX: &[&str] = &["", "std", "diagram", "async", "async-tokio", "debug-log"];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Automation tasks for flash-fsm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks for a specific target
    Ci {
        /// Target triple to build for
        #[arg(long, default_value = HOST)]
        target: String,
    },
    /// Run all tests
    Test,
    /// Run benchmarks in smoke mode
    Bench {
        /// Only make sure the benches compile
        #[arg(long)]
        smoke: bool,
    },
    /// Check flash-fsm-core under each feature combination
    Features,
    /// Check all targets
    CheckAll,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { target } => run_ci(&target),
        Commands::Test => run_tests(),
        Commands::Bench { smoke } => run_benchmarks(smoke),
        Commands::Features => check_features(),
        Commands::CheckAll => check_all_targets(),
    }
}

fn run_ci(target: &str) -> Result<()> {
    println!("Running CI for target: {target}");

    if target == CORTEX_M {
        // Firmware builds: core without std, then the blinky example.
        run_command(&[
            "cargo",
            "check",
            "--target",
            target,
            "-p",
            "flash-fsm-core",
            "--no-default-features",
        ])?;
        run_command(&[
            "cargo",
            "build",
            "--target",
            target,
            "-p",
            "flash-fsm-core",
            "--example",
            "blinky_cortex_m",
            "--features",
            "panic-halt",
            "--release",
        ])?;
        println!("✓ Embedded target {target} builds successfully");
    } else {
        run_command(&["cargo", "check", "--workspace"])?;
        run_command(&[
            "cargo",
            "test",
            "-p",
            "flash-fsm-core",
            "--features",
            "std,diagram",
        ])?;
        run_command(&["cargo", "test", "-p", "flash-fsm-macro"])?;
        run_command(&["cargo", "test", "-p", "flash-fsm-tests"])?;
        run_command(&["cargo", "test", "-p", "flash-fsm"])?;
        run_command(&["cargo", "check", "-p", "flash-fsm-bench", "--benches"])?;
        println!("✓ Host target {target} passes all checks");
    }

    Ok(())
}

fn run_tests() -> Result<()> {
    println!("Running all tests...");
    run_command(&[
        "cargo",
        "test",
        "-p",
        "flash-fsm-core",
        "--features",
        "std,diagram,async-tokio",
    ])?;
    run_command(&["cargo", "test", "-p", "flash-fsm-tests"])?;
    run_command(&["cargo", "test", "-p", "flash-fsm"])?;
    println!("✓ All tests passed");
    Ok(())
}

fn run_benchmarks(smoke: bool) -> Result<()> {
    if smoke {
        println!("Running benchmarks in smoke mode...");
        run_command(&["cargo", "check", "-p", "flash-fsm-bench", "--benches"])?;
        println!("✓ Benchmarks compile successfully");
    } else {
        println!("Running full benchmarks...");
        run_command(&["cargo", "bench", "-p", "flash-fsm-bench"])?;
        println!("✓ Benchmarks completed");
    }
    Ok(())
}

fn check_features() -> Result<()> {
    for features in FEATURE_MATRIX {
        println!("Checking flash-fsm-core with features [{features}]");
        let mut args = vec![
            "cargo",
            "check",
            "-p",
            "flash-fsm-core",
            "--no-default-features",
        ];
        if !features.is_empty() {
            args.extend(["--features", features]);
        }
        run_command(&args)?;
    }
    println!("✓ Every feature set builds");
    Ok(())
}

fn check_all_targets() -> Result<()> {
    for target in [HOST, CORTEX_M] {
        println!("Checking target: {target}");
        run_ci(target)?;
    }
    check_features()?;

    println!("✓ All targets check successfully");
    Ok(())
}

fn run_command(args: &[&str]) -> Result<()> {
    let (program, rest) = args.split_first().context("empty command")?;
    let output = Command::new(program)
        .args(rest)
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    if !output.status.success() {
        anyhow::bail!(
            "Command failed: {}\nstdout: {}\nstderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}
