//! pi-node — the claim scheduler process binary.
//!
//! Startup sequence:
//!   1. Load configuration from the environment (`--config-check` stops here)
//!   2. Build the shared clock, ledger client, and supervisor
//!   3. Bind and run the REST server
//!   4. On SIGINT/SIGTERM, drain every scheduled task before exiting

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pi_core::{Config, SystemClock};
use pi_scheduler::Supervisor;

#[derive(Parser, Debug)]
#[command(
    name = "pi-node",
    version,
    about = "Monitors claimable balances and submits timed claim transactions"
)]
struct Args {
    /// Override the listen address (host:port). Defaults to
    /// `0.0.0.0:{PORT}` with `PORT` from the environment (spec default 8080).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Load and validate configuration, print it, and exit without binding
    /// a server or starting any scheduled task.
    #[arg(long)]
    config_check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pi=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env().context("loading configuration")?;

    if args.config_check {
        println!("{config:#?}");
        return Ok(());
    }

    let bind_addr = args
        .bind
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], config.port)));

    info!(%bind_addr, ledger = %config.ledger_base_url, "pi-node starting");

    let clock: Arc<dyn pi_core::Clock> = Arc::new(SystemClock);
    let supervisor = Supervisor::new_with_http_ledger(config, clock);

    let shutdown_supervisor = supervisor.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received, draining scheduled tasks");
        shutdown_supervisor.shutdown().await;
        info!("shutdown complete");
        std::process::exit(0);
    });

    pi_api::serve(supervisor, bind_addr).await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
