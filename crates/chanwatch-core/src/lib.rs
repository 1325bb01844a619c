//! Chanwatch Core - Foundation crate for the sales-channel audit.
//!
//! This crate provides the shared domain types, error handling and
//! configuration management that every other Chanwatch crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Domain newtypes (`ProductId`, `ScanKey`, `ScanCursor`, `ChannelGroup`)
//!   and the per-run `ScanResult`
//!
//! # Example
//!
//! ```rust
//! use chanwatch_core::{ChannelGroup, VendorFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let group = ChannelGroup::new(["Online Store", "Carro"])?;
//! assert_eq!(group.len(), 2);
//!
//! let filter: VendorFilter = "A-M".parse()?;
//! assert!(filter.matches("acme"));
//! assert!(!filter.matches("Zebra Goods"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, CatalogConfig, ChannelSource, NotificationConfig, ScanConfig, StoreBackend,
    StoreConfig,
};
pub use error::{ChanwatchError, ConfigError, ConfigResult, Result};
pub use types::{
    ChannelGroup, Product, ProductId, ScanCursor, ScanKey, ScanResult, StopReason, VendorFilter,
};
