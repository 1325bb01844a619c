//! Construction of the scan engine and its collaborators from configuration.

use anyhow::Context;
use chanwatch_catalog::ShopifyFetcher;
use chanwatch_core::{AppConfig, NotificationConfig, StoreBackend, StoreConfig};
use chanwatch_mail::{LogNotifier, Notifier, SmtpNotifier};
use chanwatch_scanner::{ScanEngine, ScanSettings};
use chanwatch_store::{CursorStore, MemoryCursorStore, RedisCursorStore, SqliteCursorStore};
use std::path::PathBuf;
use std::sync::Arc;

/// File name of the SQLite cursor database inside the data directory.
const SQLITE_FILE: &str = "cursors.db";

/// Load configuration from `path` (or the default location) with
/// environment overrides applied.
pub fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_with_env(path).context("failed to load configuration")?;
    Ok(config)
}

/// Open the configured cursor store.
pub async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn CursorStore>> {
    let store: Arc<dyn CursorStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryCursorStore::new()),
        StoreBackend::Sqlite => {
            let path = sqlite_path(config)?;
            let store = SqliteCursorStore::open(&path)
                .await
                .with_context(|| format!("failed to open cursor database {}", path.display()))?;
            Arc::new(store)
        }
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("store.redis_url is required for the redis backend")?;
            let store = RedisCursorStore::connect(url)
                .await
                .context("failed to connect to the redis cursor store")?;
            Arc::new(store)
        }
    };

    tracing::debug!("Using {} cursor store", store.backend());
    Ok(store)
}

fn sqlite_path(config: &StoreConfig) -> anyhow::Result<PathBuf> {
    match &config.sqlite_path {
        Some(path) => Ok(path.clone()),
        None => Ok(AppConfig::data_dir()
            .context("cannot determine the data directory for the cursor database")?
            .join(SQLITE_FILE)),
    }
}

/// Build the notifier: SMTP when notifications are enabled, the log otherwise.
pub fn build_notifier(config: &NotificationConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    if config.enabled {
        let notifier = SmtpNotifier::from_config(config).context("invalid notification settings")?;
        Ok(Arc::new(notifier))
    } else {
        Ok(Arc::new(LogNotifier))
    }
}

/// Wrap `store` for a dry run: the engine works on an in-memory copy of the
/// current cursor, so the real store is only read.
pub async fn dry_run_store(
    store: &dyn CursorStore,
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn CursorStore>> {
    let key = &config.scan.scan_key;
    let cursor = store
        .load(key)
        .await
        .context("failed to read the stored cursor")?;

    Ok(match cursor {
        Some(cursor) => Arc::new(MemoryCursorStore::with_cursor(key.clone(), cursor)),
        None => Arc::new(MemoryCursorStore::new()),
    })
}

/// Assemble a scan engine for `config`.
pub async fn build_engine(config: &AppConfig, dry_run: bool) -> anyhow::Result<ScanEngine> {
    let fetcher = ShopifyFetcher::from_config(&config.catalog, config.scan.page_size)
        .context("failed to set up the catalog client")?;

    let store = open_store(&config.store).await?;
    let (store, notifier): (Arc<dyn CursorStore>, Arc<dyn Notifier>) = if dry_run {
        tracing::info!("Dry run: cursor will not be committed and reports are only logged");
        (dry_run_store(store.as_ref(), config).await?, Arc::new(LogNotifier))
    } else {
        (store, build_notifier(&config.notifications)?)
    };

    Ok(ScanEngine::new(
        Arc::new(fetcher),
        store,
        notifier,
        ScanSettings::from_config(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanwatch_core::{ScanCursor, ScanKey};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_sqlite_store_at_configured_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state").join("cursors.db");
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_path: Some(path.clone()),
            ..StoreConfig::default()
        };

        let store = open_store(&config).await.expect("open store");
        assert_eq!(store.backend(), "sqlite");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_redis_backend_needs_url() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            redis_url: None,
            ..StoreConfig::default()
        };
        assert!(open_store(&config).await.is_err());
    }

    #[test]
    fn test_disabled_notifications_log_only() {
        let notifier = build_notifier(&NotificationConfig::default()).expect("notifier");
        assert_eq!(notifier.channel(), "log");
    }

    #[tokio::test]
    async fn test_enabled_notifications_use_smtp() {
        let config = NotificationConfig {
            enabled: true,
            to: vec!["ops@example.com".to_string()],
            smtp_host: "smtp.example.com".to_string(),
            ..NotificationConfig::default()
        };
        let notifier = build_notifier(&config).expect("notifier");
        assert_eq!(notifier.channel(), "smtp");
    }

    #[tokio::test]
    async fn test_dry_run_store_copies_cursor_without_writing_back() {
        let config = AppConfig::default();
        let key = ScanKey::default();
        let real = MemoryCursorStore::with_cursor(key.clone(), ScanCursor::new("page-4"));

        let copy = dry_run_store(&real, &config).await.expect("dry run store");
        assert_eq!(
            copy.load(&key).await.expect("load"),
            Some(ScanCursor::new("page-4"))
        );

        copy.clear(&key).await.expect("clear copy");
        assert_eq!(
            real.load(&key).await.expect("load"),
            Some(ScanCursor::new("page-4"))
        );
    }

    #[tokio::test]
    async fn test_engine_requires_catalog_credentials() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Memory;
        let err = build_engine(&config, false)
            .await
            .err()
            .expect("missing shop domain");
        assert!(err.to_string().contains("catalog client"));
    }
}
