// ===============================
// src/main.rs
// ===============================
/*
=============================================================================
Project : order_watch — Binance open-orders desktop monitor
Version : 0.1.0
License : MIT (see LICENSE)

Summary : Polls GET /api/v3/openOrders for one trading pair on a fixed
          interval, signs every request with HMAC-SHA256 (API / SECRET from
          env or .env), and raises a desktop notification saying whether
          pending orders exist. Optional Prometheus metrics on METRICS_PORT.
=============================================================================
*/
mod binance; // signer + REST models
mod client;
mod config;
mod metrics;
mod monitor;
mod notifier;
mod scheduler;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::client::BinanceClient;
use crate::monitor::Monitor;
use crate::notifier::DesktopNotifier;

#[derive(Debug, Parser)]
#[command(name = "order_watch", version, about = "Watch Binance open orders and notify on the desktop")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monitor pending transactions (default)
    Monitor,
}

#[tokio::main]
async fn main() -> ExitCode {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => run_monitor().await,
    }
}

async fn run_monitor() -> ExitCode {
    let cfg = config::load();

    // fail fast: no secret, no requests
    let client = match BinanceClient::new(&cfg) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    metrics::init();
    if let Some(port) = cfg.metrics_port {
        tokio::spawn(metrics::serve_metrics(port));
    }

    info!(
        symbol = %client.symbol(),
        recv_window = cfg.recv_window,
        rest = %cfg.rest_base,
        poll_secs = cfg.poll_interval.as_secs(),
        "fetching open orders"
    );

    let symbol = client.symbol().to_string();
    Monitor::new(client, DesktopNotifier, symbol)
        .run(cfg.poll_interval)
        .await;
    ExitCode::SUCCESS
}
