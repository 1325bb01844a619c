//! Command handlers.

use crate::app::{build_engine, load_config, open_store};
use crate::args::{Cli, Command, ScanArgs};
use crate::{EXIT_CANCELLED, EXIT_VIOLATIONS};
use chanwatch_core::{AppConfig, ScanKey, ScanResult};
use chanwatch_scanner::{ScanEngine, ScanError};
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the command selected on the command line.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> anyhow::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run { scan } => {
            scan.apply(&mut config)?;
            run_once(&config, &scan, &cancel).await
        }
        Command::Watch {
            scan,
            interval_secs,
        } => {
            scan.apply(&mut config)?;
            watch(&config, &scan, Duration::from_secs(interval_secs), &cancel).await
        }
        Command::ShowCursor { scan_key } => {
            let key = scan_key.unwrap_or_else(|| config.scan.scan_key.clone());
            println!("{}", show_cursor(&config, &key).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::ResetCursor { scan_key } => {
            let key = scan_key.unwrap_or_else(|| config.scan.scan_key.clone());
            reset_cursor(&config, &key).await?;
            println!("cursor for '{key}' cleared");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run a single scan and print its summary.
pub async fn run_once(
    config: &AppConfig,
    args: &ScanArgs,
    cancel: &CancellationToken,
) -> anyhow::Result<ExitCode> {
    let engine = build_engine(config, args.dry_run).await?;

    match engine.run(cancel).await {
        Ok(result) => {
            println!("{}", summary(&result));
            if args.fail_on_violations && !result.is_clean() {
                return Ok(ExitCode::from(EXIT_VIOLATIONS));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ScanError::Cancelled { .. }) => Ok(ExitCode::from(EXIT_CANCELLED)),
        Err(e) => Err(e.into()),
    }
}

/// Run scans at a fixed interval until cancelled.
///
/// A failed scan is logged and retried at the next tick; the stored cursor
/// still points at the last committed position.
pub async fn watch(
    config: &AppConfig,
    args: &ScanArgs,
    interval: Duration,
    cancel: &CancellationToken,
) -> anyhow::Result<ExitCode> {
    let engine = build_engine(config, args.dry_run).await?;
    tracing::info!("Watching catalog every {:?}", interval);
    watch_loop(&engine, interval, cancel).await;
    Ok(ExitCode::from(EXIT_CANCELLED))
}

async fn watch_loop(engine: &ScanEngine, interval: Duration, cancel: &CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match engine.run(cancel).await {
            Ok(result) => println!("{}", summary(&result)),
            Err(ScanError::Cancelled { .. }) => break,
            Err(e) => tracing::error!("Scan failed, retrying at the next interval: {}", e),
        }
    }

    tracing::info!("Watch stopped");
}

/// Describe the stored cursor for `key`.
pub async fn show_cursor(config: &AppConfig, key: &ScanKey) -> anyhow::Result<String> {
    let store = open_store(&config.store).await?;
    let cursor = store.load(key).await?;

    Ok(match cursor {
        Some(cursor) => format!("{key}: {cursor}"),
        None => format!("{key}: no stored cursor (next scan starts from the beginning)"),
    })
}

/// Clear the stored cursor for `key`.
pub async fn reset_cursor(config: &AppConfig, key: &ScanKey) -> anyhow::Result<()> {
    let store = open_store(&config.store).await?;
    store.clear(key).await?;
    tracing::info!("Cleared cursor for scan key {} ({})", key, store.backend());
    Ok(())
}

fn summary(result: &ScanResult) -> String {
    let mut out = format!(
        "scan {} ({}): checked {} products, skipped {}, {} page(s), {}",
        result.run_id,
        result.scan_key,
        result.checked_count,
        result.skipped_count,
        result.pages_fetched,
        result.stop_reason
    );

    if result.is_clean() {
        out.push_str("\nno violations");
    } else {
        out.push_str(&format!(
            "\n{} product(s) with invalid channel groups:",
            result.invalid_product_ids.len()
        ));
        for id in &result.invalid_product_ids {
            out.push('\n');
            out.push_str(id.as_str());
        }
    }
    out
}
