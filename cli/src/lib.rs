//! Chanwatch command-line interface.
//!
//! Wires configuration, the cursor store, the catalog fetcher and the
//! notifier into a scan engine, and exposes operator commands for running
//! scans and inspecting or resetting the stored cursor.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod app;
pub mod args;
pub mod commands;

pub use args::{Cli, Command, ScanArgs};

use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

/// Exit status for a run that was interrupted.
pub const EXIT_CANCELLED: u8 = 130;

/// Exit status when `--fail-on-violations` is set and violations were found.
pub const EXIT_VIOLATIONS: u8 = 2;

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,chanwatch=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; abandoning the current scan");
            token.cancel();
        }
    });
}

/// Parse arguments, run the requested command and map the outcome to an
/// exit status.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match commands::dispatch(cli, cancel).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
