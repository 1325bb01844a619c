//! Error types for the catalog fetcher.

use thiserror::Error;

/// Errors that can occur while fetching catalog pages.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A single attempt failed in a way worth retrying
    #[error("transient upstream failure: {message}")]
    Transient {
        /// Error message
        message: String,
    },

    /// Transient failures persisted through every attempt
    #[error("upstream still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Message of the final failure
        last: String,
    },

    /// The upstream refused the request (authorization or validation)
    #[error("upstream rejected request{}: {message}", http_suffix(.status))]
    Rejected {
        /// HTTP status code, when the rejection was an HTTP error
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The response payload did not match the expected shape
    #[error("malformed upstream payload: {0}")]
    Protocol(String),

    /// The fetcher could not be constructed
    #[error("catalog client error: {0}")]
    Client(String),
}

impl CatalogError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub(crate) fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            Self::transient(e.to_string())
        } else if e.is_decode() {
            Self::Protocol(e.to_string())
        } else {
            Self::Client(e.to_string())
        }
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(CatalogError::transient("timeout").is_transient());
        assert!(!CatalogError::Protocol("missing pageInfo".to_string()).is_transient());
        assert!(!CatalogError::Rejected {
            status: Some(401),
            message: "bad token".to_string()
        }
        .is_transient());
        assert!(!CatalogError::RetriesExhausted {
            attempts: 3,
            last: "503".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_rejected_display() {
        let err = CatalogError::Rejected {
            status: Some(403),
            message: "access denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream rejected request (HTTP 403): access denied"
        );

        let err = CatalogError::Rejected {
            status: None,
            message: "Field 'prodcts' doesn't exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream rejected request: Field 'prodcts' doesn't exist"
        );
    }
}
