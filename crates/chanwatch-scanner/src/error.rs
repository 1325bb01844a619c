//! Scan error types.

use chanwatch_catalog::CatalogError;
use chanwatch_store::StoreError;
use thiserror::Error;

/// Errors that abort a scan run. None of them commit a cursor.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The cursor store could not be read or written
    #[error("cursor store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The upstream refused the request; retrying will not help
    #[error("upstream rejected the request: {0}")]
    UpstreamRejected(#[source] CatalogError),

    /// The upstream response no longer matches the expected contract
    #[error("upstream contract violation: {0}")]
    UpstreamProtocolError(#[source] CatalogError),

    /// The upstream kept failing transiently after every retry
    #[error("upstream unavailable: {0}")]
    UpstreamTransient(#[source] CatalogError),

    /// The caller cancelled the run
    #[error("scan cancelled after checking {checked} products")]
    Cancelled {
        /// Products checked before cancellation
        checked: u64,
    },
}

impl From<CatalogError> for ScanError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Protocol(_) => Self::UpstreamProtocolError(e),
            CatalogError::Transient { .. } | CatalogError::RetriesExhausted { .. } => {
                Self::UpstreamTransient(e)
            }
            CatalogError::Rejected { .. } | CatalogError::Client(_) => Self::UpstreamRejected(e),
        }
    }
}

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_are_classified() {
        assert!(matches!(
            ScanError::from(CatalogError::Protocol("missing pageInfo".to_string())),
            ScanError::UpstreamProtocolError(_)
        ));
        assert!(matches!(
            ScanError::from(CatalogError::RetriesExhausted {
                attempts: 3,
                last: "HTTP 503".to_string()
            }),
            ScanError::UpstreamTransient(_)
        ));
        assert!(matches!(
            ScanError::from(CatalogError::Rejected {
                status: Some(401),
                message: "invalid token".to_string()
            }),
            ScanError::UpstreamRejected(_)
        ));
    }

    #[test]
    fn test_store_error_display() {
        let err = ScanError::from(StoreError::Open("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            "cursor store unavailable: failed to open cursor store: connection refused"
        );
    }
}
