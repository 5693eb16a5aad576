//! Auth service
//!
//! ```text
//!   config.yaml ──▶ config ──▶ observability (logs, metrics)
//!                      │
//!                      ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ lifecycle::bootstrap                                      │
//!   │   db (retry) ─▶ repo ─▶ cloud clients ─▶ rpc ─▶ handlers │
//!   └──────────────────────────────┬───────────────────────────┘
//!                                  ▼
//!   Client ─────▶ net::listener ─▶ http::server ─▶ handlers
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use auth_service::config::AppConfig;
use auth_service::lifecycle::prepare;
use auth_service::observability::metrics;
use auth_service::{bootstrap, Shutdown, StartupError};

#[derive(Debug, Parser)]
#[command(name = "auth-service", version, about = "User authentication service")]
struct Cli {
    /// Directory containing config.yaml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is configured from the file, so nothing can be logged before it loads.
    let config = match prepare(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("auth-service: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "auth-service starting");

    if config.metrics.enabled {
        if let Some(addr) = config.metrics.socket_addr() {
            metrics::init_metrics(addr)?;
        }
    }

    let app = bootstrap(config).await?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    app.run(rx).await
}
