//! Basic-auth reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──┬─▶ GET /-/ready, /-/healthy ──▶ health::probe ──┐
//!                             │                                               ├──▶ Upstream
//!                             └─▶ everything else ──▶ auth ──▶ http::proxy ───┘
//!
//!   config: loaded once at startup      lifecycle: SIGINT/SIGTERM → drain → exit
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use basic_auth_proxy::lifecycle::{bootstrap, serve_until_signal, TerminationSignals};
use basic_auth_proxy::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "basic-auth-proxy")]
#[command(about = "Reverse proxy that gates a single upstream behind HTTP Basic authentication", long_about = None)]
struct Cli {
    /// Path to the JSON or YAML config file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log filter directive, e.g. "info" or "basic_auth_proxy=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    tracing::info!("basic-auth-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let signals = match TerminationSignals::register() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    let startup = match bootstrap(&cli.config).await {
        Ok(startup) => startup,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    serve_until_signal(startup.server, startup.listener, signals).await;
    ExitCode::SUCCESS
}
