//! # Elevator Control Unit
//!
//! Loads the elevator configuration, creates the requested actuator driver
//! from the registry, performs RT setup and runs the periodic control loop
//! until ctrl-c (or `--cycles`). The driver is shut down on every exit path.

use clap::Parser;
use elevator_common::config::{ConfigLoader, LogLevel};
use elevator_common::consts::{DEFAULT_CONFIG_PATH, SIMULATION_DRIVER};
use elevator_common::elevator::ElevatorConfig;
use elevator_control_unit::ElevatorController;
use elevator_control_unit::cycle::{CycleRunner, rt_setup};
use elevator_hal::DriverRegistry;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Elevator Control Unit: guarded position control loop
#[derive(Parser, Debug)]
#[command(name = "elevator_control_unit")]
#[command(version)]
#[command(about = "Periodic position control loop for a leader/follower elevator")]
struct Args {
    /// Path to the elevator configuration TOML.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Actuator driver to load from the registry.
    #[arg(long, default_value = SIMULATION_DRIVER)]
    driver: String,

    /// Initial target height, queued before the first cycle.
    #[arg(long, value_name = "HEIGHT", allow_negative_numbers = true)]
    target: Option<f64>,

    /// Stop after this many cycles (default: run until ctrl-c).
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// CPU core to pin the control thread to (rt feature only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (rt feature only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Parse errors are reported by `run()` once logging is up.
    let log_level = ElevatorConfig::load(&args.config)
        .map(|config| config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Elevator Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Elevator Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading config from {}", args.config.display());
    let config = ElevatorConfig::load_validated(&args.config)?;
    info!(
        "Config OK: service={}, cycle_time={}us, travel=[{}, {}]",
        config.shared.service_name,
        config.cycle_time_us,
        config.travel.min_height,
        config.travel.max_height
    );

    let registry = DriverRegistry::with_builtin_drivers();
    let driver = registry.create_driver(&args.driver, &config)?;
    let controller = ElevatorController::new(&config, driver)?;

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = CycleRunner::new(controller, config.cycle_time());

    if let Some(height) = args.target {
        runner.setpoint_sender().set_height(height)?;
    }

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    runner.run(args.cycles)?;

    let status = runner.status().snapshot();
    info!(
        "Final status: target={}, height={:.3}, zone={:?}, ticks={}, skipped={}",
        status.target, status.height, status.zone, status.ticks, status.skipped
    );

    runner.shutdown()?;
    Ok(())
}

/// Setup tracing subscriber: `RUST_LOG` wins, then `--verbose`, then the config level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

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
