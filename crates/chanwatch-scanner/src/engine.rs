//! Resumable catalog scan engine.
//!
//! One call to [`ScanEngine::run`] is one scan run:
//!
//! 1. Load the stored cursor for the scan key.
//! 2. Fetch pages strictly in order, validating every product that passes
//!    the vendor filter. Bounds are checked between pages only, so a page is
//!    always processed completely.
//! 3. Commit: clear the cursor when the catalog was exhausted, otherwise
//!    store the continuation cursor.
//! 4. Report the result through the notifier.
//!
//! Any store or catalog failure, or cancellation, returns before step 3 and
//! leaves the previously stored cursor in place.

use crate::error::{Result, ScanError};
use crate::filter::{in_vendor_scope, is_compliant};
use chanwatch_catalog::PageFetcher;
use chanwatch_core::{
    AppConfig, ChannelGroup, ProductId, ScanCursor, ScanKey, ScanResult, StopReason, VendorFilter,
};
use chanwatch_mail::{render_report, Notifier};
use chanwatch_store::{CursorStore, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Per-run parameters of the scan engine.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Key the cursor is stored under
    pub scan_key: ScanKey,
    /// Pages fetched before the run stops
    pub max_pages: u32,
    /// Stop once this many products have been validated
    pub max_checked: Option<u64>,
    /// Only products whose vendor falls in this range are validated
    pub vendor_filter: Option<VendorFilter>,
    /// Accepted channel groups
    pub valid_groups: Vec<ChannelGroup>,
    /// Channels removed before validation
    pub ignored_channels: Vec<String>,
    /// Deadline for each cursor store call
    pub store_timeout: Duration,
    /// Report runs without violations too
    pub notify_when_clean: bool,
}

impl ScanSettings {
    /// Settings taken from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scan_key: config.scan.scan_key.clone(),
            max_pages: config.scan.max_pages,
            max_checked: config.scan.max_checked,
            vendor_filter: config.scan.vendor_range,
            valid_groups: config.scan.valid_groups.clone(),
            ignored_channels: config.scan.ignored_channels.clone(),
            store_timeout: config.store.timeout(),
            notify_when_clean: config.notifications.notify_when_clean,
        }
    }
}

/// Running totals of one scan.
#[derive(Debug, Default)]
struct Progress {
    checked: u64,
    skipped: u64,
    pages: u32,
    invalid: Vec<ProductId>,
    seen_invalid: HashSet<ProductId>,
}

/// Drives scan runs over an injected fetcher, cursor store and notifier.
pub struct ScanEngine {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn CursorStore>,
    notifier: Arc<dyn Notifier>,
    settings: ScanSettings,
}

impl ScanEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn CursorStore>,
        notifier: Arc<dyn Notifier>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            settings,
        }
    }

    /// Execute one scan run.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the cursor cannot be loaded or
    /// committed, an upstream error if a page cannot be fetched, and
    /// `Cancelled` if `cancel` fires before the commit.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ScanResult> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "scan",
            %run_id,
            scan_key = %self.settings.scan_key
        );
        self.execute(run_id, cancel).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, cancel: &CancellationToken) -> Result<ScanResult> {
        let started_at = Utc::now();
        let key = &self.settings.scan_key;

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled { checked: 0 });
        }

        let mut cursor = self
            .store_call("load", self.store.load(key))
            .await
            .map_err(|e| abort(e, 0))?;

        match &cursor {
            Some(c) => tracing::info!("Resuming scan from cursor {}", c),
            None => tracing::info!("Starting scan from the beginning of the catalog"),
        }

        let mut progress = Progress::default();
        let stop_reason = loop {
            let page = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::warn!(
                        "Scan cancelled after checking {} products; cursor left unchanged",
                        progress.checked
                    );
                    return Err(ScanError::Cancelled { checked: progress.checked });
                }
                page = self.fetcher.fetch_page(cursor.as_ref()) => {
                    page.map_err(|e| abort(e.into(), progress.checked))?
                }
            };

            progress.pages += 1;
            let has_more = page.has_more();
            let page_len = page.products.len();

            for product in &page.products {
                if !in_vendor_scope(self.settings.vendor_filter.as_ref(), &product.vendor) {
                    progress.skipped += 1;
                    continue;
                }

                progress.checked += 1;
                if !is_compliant(
                    &product.channel_names,
                    &self.settings.valid_groups,
                    &self.settings.ignored_channels,
                ) && progress.seen_invalid.insert(product.id.clone())
                {
                    tracing::debug!(
                        product_id = %product.id,
                        channels = ?product.channel_names,
                        "Product matches no valid channel group"
                    );
                    progress.invalid.push(product.id.clone());
                }
            }

            tracing::debug!(
                page = progress.pages,
                products = page_len,
                checked = progress.checked,
                has_more,
                "Processed page"
            );

            cursor = page.next_cursor;

            if !has_more {
                break StopReason::Exhausted;
            }
            if progress.pages >= self.settings.max_pages {
                break StopReason::PageBound;
            }
            if self
                .settings
                .max_checked
                .is_some_and(|max| progress.checked >= max)
            {
                break StopReason::CheckedBound;
            }
        };

        if cancel.is_cancelled() {
            tracing::warn!("Scan cancelled before commit; cursor left unchanged");
            return Err(ScanError::Cancelled {
                checked: progress.checked,
            });
        }

        self.commit(cursor.as_ref())
            .await
            .map_err(|e| abort(e, progress.checked))?;

        let result = ScanResult {
            run_id,
            scan_key: key.clone(),
            checked_count: progress.checked,
            skipped_count: progress.skipped,
            pages_fetched: progress.pages,
            invalid_product_ids: progress.invalid,
            stop_reason,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            checked = result.checked_count,
            skipped = result.skipped_count,
            pages = result.pages_fetched,
            violations = result.invalid_product_ids.len(),
            "Scan finished: {}",
            result.stop_reason
        );

        self.report(&result).await;
        Ok(result)
    }

    /// Persist where the next run starts.
    async fn commit(&self, next: Option<&ScanCursor>) -> Result<()> {
        let key = &self.settings.scan_key;
        match next {
            Some(next) => {
                self.store_call("save", self.store.save(key, next)).await?;
                tracing::info!("Stored continuation cursor {} ({})", next, self.store.backend());
            }
            None => {
                self.store_call("clear", self.store.clear(key)).await?;
                tracing::info!(
                    "Catalog exhausted; cleared cursor ({})",
                    self.store.backend()
                );
            }
        }
        Ok(())
    }

    /// Send the report, if there is one to send. Failures are logged only.
    async fn report(&self, result: &ScanResult) {
        if result.is_clean() && !self.settings.notify_when_clean {
            tracing::debug!("No violations; skipping notification");
            return;
        }

        let report = render_report(result);
        if let Err(e) = self.notifier.notify(&report).await {
            tracing::error!(
                "Failed to deliver scan report via {}: {}",
                self.notifier.channel(),
                e
            );
        }
    }

    async fn store_call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = chanwatch_store::Result<T>>,
    {
        let after = self.settings.store_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout { operation, after }.into()),
        }
    }
}

/// Log a fatal error with the progress made so far.
fn abort(err: ScanError, checked: u64) -> ScanError {
    match &err {
        ScanError::UpstreamProtocolError(_) => tracing::error!(
            "Upstream response no longer matches the expected shape; aborting after {} products: {}",
            checked,
            err
        ),
        _ => tracing::error!("Scan aborted after checking {} products: {}", checked, err),
    }
    err
}
