//! Error types for report delivery.

use thiserror::Error;

/// Errors that can occur while delivering a report.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// A sender or recipient address could not be parsed
    #[error("bad address '{address}': {reason}")]
    Address {
        /// The offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// Notifications are enabled but incompletely configured
    #[error("notifier not configured: {0}")]
    NotConfigured(String),

    /// The message could not be assembled
    #[error("failed to build message: {0}")]
    Build(String),

    /// The SMTP exchange failed
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Result type alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
