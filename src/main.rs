//! ipmi-fan-curve entry point: config, logging, status server and the control loop.

mod app;
mod config;
mod control;
mod display;
mod hardware;
mod status;
mod system;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use app::cli::Args;
use app::logging::{init_tracing, level_filter};
use config::loader::load_config;
use control::curve::SpeedLevel;
use control::readiness::{self, Readiness};
use control::runner::{acquire, ControlLoop};
use display::{LinePresenter, Presenter, TerminalPresenter};
use hardware::{BmcBackend, IpmiBackend};
use status::publisher::SnapshotPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).await?;
    args.apply_to(&mut config);

    let filter = match level_filter(&config.logging.level) {
        Some(filter) => filter,
        None => {
            eprintln!("Unknown log level '{}', using INFO", config.logging.level);
            "info"
        }
    };
    // The dashboard owns the terminal; logs then go to the file layer only.
    let console = !args.tui || args.test;
    init_tracing(filter, console, config.logging.log_file.as_deref().map(Path::new))?;

    info!("Starting ipmi-fan-curve v{}", env!("CARGO_PKG_VERSION"));
    match &args.config {
        Some(path) => info!("Loaded configuration from: {:?}", path),
        None => info!("No config file given, using defaults and environment"),
    }
    info!("BMC: {} via {} as {}", config.ipmi.host, config.ipmi.interface, config.ipmi.user);
    if config.control.dry_run {
        warn!("Dry run enabled: fan speed commands will only be logged");
    }

    let backend: Arc<dyn BmcBackend> = Arc::new(IpmiBackend::new(&config));

    if args.test {
        return run_test_mode(backend.as_ref()).await;
    }

    let publisher = SnapshotPublisher::new();
    if config.status.enabled {
        status::server::start(&config.status.listen, publisher.clone())?;
    } else {
        info!("Status endpoint disabled");
    }

    let presenter: Box<dyn Presenter> = if args.tui {
        Box::new(TerminalPresenter::new()?)
    } else {
        Box::new(LinePresenter::stdout())
    };

    let mut control = ControlLoop::new(Arc::clone(&backend), publisher, presenter, &config.control);

    // Dropping the loop future cancels any in-flight tool call (kill_on_drop).
    let result = tokio::select! {
        result = control.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
            Ok(())
        }
    };

    // Restores the terminal before anything else is printed
    drop(control);

    if let Err(e) = backend.restore_on_exit().await {
        warn!("On-exit fan command failed: {:#}", e);
    }

    match result {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Controller stopped: {:#}", e);
            Err(e)
        }
    }
}

/// One telemetry pass; prints what would happen without touching the fans.
async fn run_test_mode(backend: &dyn BmcBackend) -> Result<()> {
    info!("Test mode: reading telemetry once, no fan commands will be sent");

    let telemetry = acquire(backend).await?;
    let snapshot = telemetry.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    match readiness::evaluate(&snapshot) {
        Readiness::Ready(max_temp) => {
            let level = SpeedLevel::for_temperature(max_temp);
            println!("Max temperature {}C -> {}", max_temp, level);
        }
        Readiness::Waiting(reasons) => {
            for reason in &reasons {
                println!("{}", reason);
            }
            println!("No fan speed would be set");
        }
    }

    Ok(())
}
