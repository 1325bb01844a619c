//! Command-line arguments.

use anyhow::Context;
use chanwatch_core::{AppConfig, ScanKey, VendorFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Audit catalog products against allowed sales-channel groups.
#[derive(Debug, Parser)]
#[command(name = "chanwatch", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scan, resuming from the stored cursor
    Run {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Run scans back-to-back at a fixed interval until interrupted
    Watch {
        #[command(flatten)]
        scan: ScanArgs,
        /// Seconds between the starts of consecutive scans
        #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
    /// Print the stored cursor for a scan key
    ShowCursor {
        /// Scan key (defaults to the configured one)
        #[arg(long)]
        scan_key: Option<ScanKey>,
    },
    /// Clear the stored cursor so the next scan starts from the beginning
    ResetCursor {
        /// Scan key (defaults to the configured one)
        #[arg(long)]
        scan_key: Option<ScanKey>,
    },
}

/// Per-invocation overrides of the `[scan]` section.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Scan key the cursor is stored under
    #[arg(long)]
    pub scan_key: Option<ScanKey>,

    /// Products requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Pages fetched before the scan stops
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Stop once this many products have been checked
    #[arg(long)]
    pub max_checked: Option<u64>,

    /// Only check vendors whose first letter is in this range
    #[arg(long, value_name = "A-M")]
    pub vendor_range: Option<VendorFilter>,

    /// Keep the stored cursor untouched and log the report instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when violations are found
    #[arg(long)]
    pub fail_on_violations: bool,
}

impl ScanArgs {
    /// Apply the overrides and re-validate the configuration.
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(key) = &self.scan_key {
            config.scan.scan_key = key.clone();
        }
        if let Some(page_size) = self.page_size {
            config.scan.page_size = page_size;
        }
        if let Some(max_pages) = self.max_pages {
            config.scan.max_pages = max_pages;
        }
        if let Some(max_checked) = self.max_checked {
            config.scan.max_checked = Some(max_checked);
        }
        if let Some(range) = self.vendor_range {
            config.scan.vendor_range = Some(range);
        }

        config
            .validate()
            .context("invalid configuration after command-line overrides")
    }
}
