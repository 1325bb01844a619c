//! Chanwatch Scanner - channel-group validation and the catalog scan engine.
//!
//! [`is_compliant`] decides whether one product's channels satisfy at least
//! one configured group. [`ScanEngine`] pages through the catalog from the
//! stored cursor, validates every product in scope, commits the new cursor
//! and hands a report to the notifier.
//!
//! # Example
//!
//! ```
//! use chanwatch_core::ChannelGroup;
//! use chanwatch_scanner::is_compliant;
//! use std::collections::BTreeSet;
//!
//! let groups = vec![ChannelGroup::new(["Online Store", "Shop"]).unwrap()];
//! let channels: BTreeSet<String> = ["Online Store", "Shop", "Pinterest"]
//!     .into_iter()
//!     .map(String::from)
//!     .collect();
//!
//! assert!(is_compliant(&channels, &groups, &[]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod engine;
pub mod error;
pub mod filter;

// Re-export commonly used types
pub use engine::{ScanEngine, ScanSettings};
pub use error::{Result, ScanError};
pub use filter::{in_vendor_scope, is_compliant};
