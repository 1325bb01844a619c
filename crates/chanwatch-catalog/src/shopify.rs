//! Shopify Admin GraphQL page fetcher.

use crate::error::{CatalogError, Result};
use crate::graphql::{build_request, parse_page, QuerySpec};
use crate::retry::RetryPolicy;
use crate::{Page, PageFetcher};
use async_trait::async_trait;
use chanwatch_core::{CatalogConfig, ScanCursor};
use reqwest::{Client, StatusCode};

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Fetches product pages from the Shopify Admin GraphQL endpoint.
pub struct ShopifyFetcher {
    client: Client,
    endpoint: String,
    access_token: String,
    spec: QuerySpec,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ShopifyFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyFetcher")
            .field("endpoint", &self.endpoint)
            .field("spec", &self.spec)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ShopifyFetcher {
    /// Create a fetcher from catalog settings.
    ///
    /// # Errors
    /// Returns `Client` if the shop domain or access token is missing, or
    /// the HTTP client cannot be built.
    pub fn from_config(config: &CatalogConfig, page_size: u32) -> Result<Self> {
        if config.shop_domain.trim().is_empty() {
            return Err(CatalogError::Client(
                "catalog.shop_domain is not configured".to_string(),
            ));
        }
        let access_token = config.access_token.clone().ok_or_else(|| {
            CatalogError::Client("no catalog access token (set CHANWATCH_ACCESS_TOKEN)".to_string())
        })?;

        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            config.shop_domain.trim().trim_end_matches('/'),
            config.api_version
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("chanwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            access_token,
            spec: QuerySpec {
                page_size,
                source: config.channel_source,
                metafield_namespace: config.metafield_namespace.clone(),
                metafield_key: config.metafield_key.clone(),
                product_query: config.product_query.clone(),
            },
            retry: RetryPolicy::new(config.max_attempts, config.retry_base_delay()),
        })
    }

    /// Point the fetcher at a different GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The GraphQL endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request, without retries.
    async fn fetch_once(&self, cursor: Option<&ScanCursor>) -> Result<Page> {
        let body = build_request(&self.spec, cursor);

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, text));
        }

        let text = response.text().await?;
        parse_page(&text, self.spec.source)
    }
}

/// Map a non-success HTTP status to a retryable or fatal error.
fn classify_status(status: StatusCode, body: String) -> CatalogError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        CatalogError::transient(format!("HTTP {}", status.as_u16()))
    } else {
        CatalogError::Rejected {
            status: Some(status.as_u16()),
            message: body,
        }
    }
}

#[async_trait]
impl PageFetcher for ShopifyFetcher {
    async fn fetch_page(&self, cursor: Option<&ScanCursor>) -> Result<Page> {
        let page = self.retry.run(|_| self.fetch_once(cursor)).await?;

        tracing::debug!(
            products = page.products.len(),
            has_more = page.has_more(),
            "Fetched catalog page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CatalogConfig {
        CatalogConfig {
            shop_domain: "example.myshopify.com".to_string(),
            access_token: Some("shpat_test".to_string()),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn test_endpoint_from_config() {
        let fetcher = ShopifyFetcher::from_config(&config(), 50).expect("build fetcher");
        assert_eq!(
            fetcher.endpoint(),
            "https://example.myshopify.com/admin/api/2023-10/graphql.json"
        );
    }

    #[test]
    fn test_missing_credentials() {
        let mut no_token = config();
        no_token.access_token = None;
        assert!(matches!(
            ShopifyFetcher::from_config(&no_token, 50),
            Err(CatalogError::Client(_))
        ));

        let mut no_domain = config();
        no_domain.shop_domain = String::new();
        assert!(ShopifyFetcher::from_config(&no_domain, 50).is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let fetcher = ShopifyFetcher::from_config(&config(), 50).expect("build fetcher");
        assert!(!format!("{fetcher:?}").contains("shpat_test"));
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad token".to_string()),
            CatalogError::Rejected {
                status: Some(401),
                ..
            }
        ));
        assert!(!classify_status(StatusCode::UNPROCESSABLE_ENTITY, String::new()).is_transient());
    }
}
