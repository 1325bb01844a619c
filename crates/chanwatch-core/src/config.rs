//! Configuration management for Chanwatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Secrets (the catalog access token and the
//! SMTP password) are never read from or written to the TOML file.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{ChannelGroup, ScanKey, VendorFilter};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest page the upstream catalog API will serve.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Main application configuration.
///
/// This is loaded from `~/.config/chanwatch/config.toml` (or platform
/// equivalent) unless an explicit path is given. Missing sections fall back
/// to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream catalog API settings
    pub catalog: CatalogConfig,
    /// Scan behavior settings
    pub scan: ScanConfig,
    /// Cursor persistence settings
    pub store: StoreConfig,
    /// Report delivery settings
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to
    /// defaults if the file does not exist.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration (explicit path or default location) and apply
    /// environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CHANWATCH_SHOP_DOMAIN`: catalog shop domain
    /// - `CHANWATCH_ACCESS_TOKEN`: catalog API access token
    /// - `CHANWATCH_SCAN_KEY`: scan key the cursor is stored under
    /// - `CHANWATCH_MAX_PAGES`: page bound per run
    /// - `CHANWATCH_REDIS_URL`: Redis URL for the cursor store
    /// - `CHANWATCH_SMTP_PASSWORD`: SMTP password for report delivery
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// # Errors
    /// Returns `InvalidValue` if an override cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domain) = lookup("CHANWATCH_SHOP_DOMAIN") {
            tracing::debug!("Override catalog.shop_domain from env: {}", domain);
            self.catalog.shop_domain = domain;
        }

        if let Some(token) = lookup("CHANWATCH_ACCESS_TOKEN") {
            self.catalog.access_token = Some(token);
        }

        if let Some(key) = lookup("CHANWATCH_SCAN_KEY") {
            self.scan.scan_key = ScanKey::new(key)
                .map_err(|e| ConfigError::invalid("CHANWATCH_SCAN_KEY", e.to_string()))?;
            tracing::debug!("Override scan.scan_key from env: {}", self.scan.scan_key);
        }

        if let Some(val) = lookup("CHANWATCH_MAX_PAGES") {
            self.scan.max_pages = val
                .parse()
                .map_err(|e| ConfigError::invalid("CHANWATCH_MAX_PAGES", format!("{e}")))?;
            tracing::debug!("Override scan.max_pages from env: {}", self.scan.max_pages);
        }

        if let Some(url) = lookup("CHANWATCH_REDIS_URL") {
            self.store.redis_url = Some(url);
        }

        if let Some(password) = lookup("CHANWATCH_SMTP_PASSWORD") {
            self.notifications.smtp_password = Some(password);
        }

        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scan.page_size == 0 || self.scan.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::invalid(
                "scan.page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        if self.scan.max_pages == 0 {
            return Err(ConfigError::invalid("scan.max_pages", "must be at least 1"));
        }

        if self.scan.max_checked == Some(0) {
            return Err(ConfigError::invalid(
                "scan.max_checked",
                "must be at least 1 when set",
            ));
        }

        if self.scan.valid_groups.is_empty() {
            return Err(ConfigError::invalid(
                "scan.valid_groups",
                "at least one channel group is required",
            ));
        }

        if self.catalog.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "catalog.max_attempts",
                "must allow at least one attempt",
            ));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "catalog.timeout_secs",
                "must be at least 1",
            ));
        }

        if self.store.timeout_ms == 0 {
            return Err(ConfigError::invalid("store.timeout_ms", "must be at least 1"));
        }

        match self.store.backend {
            StoreBackend::Redis if self.store.redis_url.is_none() => {
                return Err(ConfigError::invalid(
                    "store.redis_url",
                    "required when store.backend = \"redis\"",
                ));
            }
            _ => {}
        }

        if self.notifications.enabled {
            if self.notifications.to.is_empty() {
                return Err(ConfigError::invalid(
                    "notifications.to",
                    "at least one recipient is required when notifications are enabled",
                ));
            }
            if self.notifications.smtp_host.is_empty() {
                return Err(ConfigError::invalid(
                    "notifications.smtp_host",
                    "required when notifications are enabled",
                ));
            }
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/chanwatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/chanwatch`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("com", "chanwatch", "chanwatch").ok_or(ConfigError::NoConfigDir)
    }
}

/// Where a product's channel list comes from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSource {
    /// Union of JSON channel lists stored in a metafield on each variant
    #[default]
    VariantMetafields,
    /// Names of the publications the product is published to
    Publications,
}

/// Upstream catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Shop domain, e.g. `example.myshopify.com`
    pub shop_domain: String,
    /// Admin API version segment
    pub api_version: String,
    /// Admin API access token (environment only)
    #[serde(skip)]
    pub access_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Total attempts per page, the first request included, before giving
    /// up on transient failures
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// Channel list source
    pub channel_source: ChannelSource,
    /// Metafield namespace holding variant channels
    pub metafield_namespace: String,
    /// Metafield key holding variant channels
    pub metafield_key: String,
    /// Optional upstream search query, e.g. `vendor:A* OR vendor:B*`
    pub product_query: Option<String>,
}

impl CatalogConfig {
    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base backoff delay.
    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            shop_domain: String::new(),
            api_version: "2023-10".to_string(),
            access_token: None,
            timeout_secs: 30,
            max_attempts: 3,
            retry_base_delay_ms: 2000,
            channel_source: ChannelSource::default(),
            metafield_namespace: "custom".to_string(),
            metafield_key: "variantchannels".to_string(),
            product_query: None,
        }
    }
}

/// Scan behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Key the resume cursor is stored under
    pub scan_key: ScanKey,
    /// Products requested per page
    pub page_size: u32,
    /// Pages fetched per run before stopping
    pub max_pages: u32,
    /// Optional bound on validated products per run
    pub max_checked: Option<u64>,
    /// Optional first-letter vendor range, e.g. `"A-M"`
    pub vendor_range: Option<VendorFilter>,
    /// Accepted channel groups; a product must satisfy at least one
    pub valid_groups: Vec<ChannelGroup>,
    /// Channels removed before validation
    pub ignored_channels: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_key: ScanKey::default(),
            page_size: 50,
            max_pages: 20,
            max_checked: None,
            vendor_range: None,
            valid_groups: Vec::new(),
            ignored_channels: Vec::new(),
        }
    }
}

/// Cursor store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process memory; cursors are lost on exit
    Memory,
    /// Local `SQLite` database
    #[default]
    Sqlite,
    /// Redis server
    Redis,
}

/// Cursor persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,
    /// `SQLite` file; defaults to `<data_dir>/cursors.db`
    pub sqlite_path: Option<PathBuf>,
    /// Redis connection URL
    pub redis_url: Option<String>,
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl StoreConfig {
    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: None,
            redis_url: None,
            timeout_ms: 5000,
        }
    }
}

/// Report delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send reports by email; when false reports are only logged
    pub enabled: bool,
    /// Also report runs that found no violations
    pub notify_when_clean: bool,
    /// Sender address
    pub from: String,
    /// Recipient addresses
    pub to: Vec<String>,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password (environment only)
    #[serde(skip)]
    pub smtp_password: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_when_clean: false,
            from: "chanwatch@localhost".to_string(),
            to: Vec::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: None,
        }
    }
}
