//! Taskboard server binary.
//!
//! ```bash
//! # Listen on the default 0.0.0.0:8080
//! cargo run --bin taskboard-server
//!
//! # Custom address, via flag or environment
//! cargo run --bin taskboard-server -- --bind 127.0.0.1:9100
//! TASKBOARD_ADDR=127.0.0.1:9100 cargo run --bin taskboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::config::{ServerCliArgs, ServerConfig};
use taskboard_server::server;
use taskboard_server::state::BoardState;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskboard server");

    let state = Arc::new(BoardState::with_config(config.max_line_length));

    let handle = match server::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskboard server listening");
            handle
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start taskboard server");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "accept loop failed");
                std::process::exit(1);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
        }
    }
}
