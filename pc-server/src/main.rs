//! pc-server - host-local node process controller
//!
//! Keeps the configured gateway nodes running: spawns them, notices
//! crashes, restarts them, and stops them all on shutdown.
//!
//! ```bash
//! # Run against ./.pc/config.toml until Ctrl-C / SIGTERM
//! pc-server
//!
//! # One reconciliation pass, print statuses, stop everything
//! pc-server --config-dir /etc/pc --once
//! ```

use pc_server::{Cli, Daemon, LogTarget, ServerError, ServerResult, logger, shutdown_signal};

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // The logger may not be up yet
            eprintln!("pc-server: {e}");
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<ExitCode> {
    // Load and validate configuration
    let config_dir = cli.config_dir()?;
    let config = pc_config::Config::load_from(&config_dir)?;
    config.validate()?;

    let log_target = LogTarget::resolve(&config_dir, &config.logging)?;
    logger::initialize(config.logging.level, &log_target)?;

    info!("Starting pc-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", config_dir.display());
    config.log_summary();

    let daemon = Daemon::build(&config, &config_dir)?;

    if cli.once {
        let (statuses, clean) = daemon.run_once().await;
        print_statuses(&statuses)?;
        return Ok(exit_code(clean));
    }

    let shutdown = CancellationToken::new();
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_for_signal.cancel();
    });

    let clean = daemon.run(shutdown).await;
    if clean {
        info!("Shutdown complete");
    } else {
        warn!("Shutdown complete, some nodes did not stop in time");
    }

    Ok(exit_code(clean))
}

fn print_statuses(statuses: &[pc_core::NodeStatus]) -> ServerResult<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, statuses)
        .map_err(std::io::Error::from)
        .and_then(|()| writeln!(stdout))
        .map_err(|e| ServerError::io("<stdout>", e))
}

fn exit_code(clean: bool) -> ExitCode {
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
