//! Chanwatch Catalog - paginated access to the upstream product catalog.
//!
//! The [`PageFetcher`] trait is the only thing the scan engine knows about
//! the catalog. [`ShopifyFetcher`] implements it against the Shopify Admin
//! GraphQL API and extracts each product's channel list from either variant
//! metafields or publications.
//!
//! # Failure handling
//!
//! - Timeouts, connection failures, HTTP 5xx/429 and GraphQL throttling are
//!   retried with exponential backoff ([`RetryPolicy`]).
//! - Other HTTP 4xx and GraphQL errors are fatal ([`CatalogError::Rejected`]).
//! - Payloads missing expected fields are fatal ([`CatalogError::Protocol`]).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod graphql;
pub mod retry;
pub mod shopify;

// Re-export commonly used types
pub use error::{CatalogError, Result};
pub use retry::RetryPolicy;
pub use shopify::ShopifyFetcher;

use async_trait::async_trait;
use chanwatch_core::{Product, ScanCursor};

/// One page of the upstream product sequence.
///
/// `next_cursor` is exactly the upstream's resume token; there are more
/// pages if and only if it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Products in upstream order
    pub products: Vec<Product>,
    /// Resume token for the following page
    pub next_cursor: Option<ScanCursor>,
}

impl Page {
    /// A page with an optional continuation cursor.
    #[must_use]
    pub fn new(products: Vec<Product>, next_cursor: Option<ScanCursor>) -> Self {
        Self {
            products,
            next_cursor,
        }
    }

    /// The final page of the sequence.
    #[must_use]
    pub fn last(products: Vec<Product>) -> Self {
        Self::new(products, None)
    }

    /// Whether the upstream has further pages.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Source of catalog pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page starting at `cursor`, or the first page when `None`.
    ///
    /// # Errors
    /// Returns `Rejected` or `Protocol` errors immediately, and a
    /// `RetriesExhausted` error once transient failures use up the policy.
    async fn fetch_page(&self, cursor: Option<&ScanCursor>) -> Result<Page>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more_follows_cursor() {
        let more = Page::new(Vec::new(), Some(ScanCursor::new("abc")));
        assert!(more.has_more());

        let done = Page::new(Vec::new(), None);
        assert!(!done.has_more());
        assert_eq!(done, Page::last(Vec::new()));
    }
}
