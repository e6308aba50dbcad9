//! # EVO Sequencer
//!
//! Scan-cycle sequencer for a cell of double-acting actuators.
//!
//! Loads and validates the sequencer TOML, performs RT setup and runs the
//! scan loop against the simulated cell until Ctrl-C or `--cycles`.

use clap::Parser;
use evo_common::consts::DEFAULT_CONFIG_PATH;
use evo_sequencer::config::{LoadedConfig, load_config};
use evo_sequencer::cycle::{CycleRunner, rt_setup};
use evo_sequencer::sim::SimulatedCell;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// EVO Sequencer: permissive-gated step sequencing in a fixed scan cycle
#[derive(Parser, Debug)]
#[command(name = "evo_sequencer")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Cyclic scan-based step sequencer for discrete process control")]
struct Args {
    /// Path to the sequencer configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// CPU core to pin the scan thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Cycles a simulated actuator needs to travel end to end.
    #[arg(long, default_value_t = 5)]
    travel_cycles: u32,

    /// Do not script operator commands in the simulated cell.
    #[arg(long)]
    no_operator: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Tracing is not up yet; the config decides its level.
    let loaded = match load_config(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_tracing(&args, "info");
            error!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };
    setup_tracing(&args, loaded.config.shared.log_level.as_directive());

    info!("EVO Sequencer v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("EVO Sequencer shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: service={}, cycle_time={}µs, actuators={}, auto_run={}",
        loaded.config.shared.service_name,
        loaded.config.cycle_time_us,
        loaded.config.actuators.len(),
        loaded.config.auto_run,
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut cell = SimulatedCell::new(loaded.config.actuators.len(), args.travel_cycles);
    if !args.no_operator {
        cell = cell.with_operator(loaded.config.auto_run);
    }
    let mut runner = CycleRunner::new(loaded, cell);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    runner.run(&running, args.cycles)?;

    let status = runner.controller().status();
    info!(
        state = ?status.state,
        step = %status.active_step.step_id,
        last_fault = ?status.last_fault_code,
        "final status"
    );
    Ok(())
}

/// Setup tracing subscriber. `RUST_LOG` overrides `default_level`.
fn setup_tracing(args: &Args, default_level: &str) {
    let level = if args.verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
