//! Chanwatch Mail - scan report rendering and delivery.
//!
//! A completed scan is turned into a [`Report`] by [`render_report`] and
//! handed to a [`Notifier`]. [`SmtpNotifier`] sends it by email through
//! lettre; [`LogNotifier`] only writes it to the log.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod report;
pub mod sender;

// Re-export commonly used types
pub use error::{NotifyError, Result};
pub use report::{render_report, Report};
pub use sender::{body_hash, LogNotifier, SmtpNotifier};

use async_trait::async_trait;

/// Delivers scan reports to an operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one report.
    async fn notify(&self, report: &Report) -> Result<()>;

    /// Short name of the delivery channel, for logging.
    fn channel(&self) -> &'static str;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    async fn notify(&self, report: &Report) -> Result<()> {
        (**self).notify(report).await
    }

    fn channel(&self) -> &'static str {
        (**self).channel()
    }
}
