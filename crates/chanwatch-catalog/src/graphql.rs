//! GraphQL documents and response decoding for the products connection.

use crate::error::{CatalogError, Result};
use crate::Page;
use chanwatch_core::{ChannelSource, Product, ProductId, ScanCursor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Variants inspected per product when channels come from metafields.
pub const VARIANTS_PER_PRODUCT: u32 = 50;

/// Publications inspected per product.
pub const PUBLICATIONS_PER_PRODUCT: u32 = 50;

const VARIANT_METAFIELDS_QUERY: &str = r"
query FetchProducts($first: Int!, $after: String, $query: String, $namespace: String!, $key: String!, $variants: Int!) {
  products(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        vendor
        variants(first: $variants) {
          edges { node { metafield(namespace: $namespace, key: $key) { value } } }
        }
      }
    }
  }
}
";

const PUBLICATIONS_QUERY: &str = r"
query FetchProducts($first: Int!, $after: String, $query: String, $publications: Int!) {
  products(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        vendor
        resourcePublications(first: $publications) {
          edges { node { isPublished publication { name } } }
        }
      }
    }
  }
}
";

/// What to ask the upstream for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Products per page
    pub page_size: u32,
    /// Where channel names come from
    pub source: ChannelSource,
    /// Variant metafield namespace
    pub metafield_namespace: String,
    /// Variant metafield key
    pub metafield_key: String,
    /// Optional upstream search string
    pub product_query: Option<String>,
}

/// JSON body of one products request.
#[derive(Debug, Serialize)]
pub struct RequestBody {
    query: &'static str,
    variables: serde_json::Value,
}

/// Build the request body for the page after `cursor`.
#[must_use]
pub fn build_request(spec: &QuerySpec, cursor: Option<&ScanCursor>) -> RequestBody {
    let after = cursor.map(ScanCursor::as_str);
    let (query, variables) = match spec.source {
        ChannelSource::VariantMetafields => (
            VARIANT_METAFIELDS_QUERY,
            serde_json::json!({
                "first": spec.page_size,
                "after": after,
                "query": spec.product_query,
                "namespace": spec.metafield_namespace,
                "key": spec.metafield_key,
                "variants": VARIANTS_PER_PRODUCT,
            }),
        ),
        ChannelSource::Publications => (
            PUBLICATIONS_QUERY,
            serde_json::json!({
                "first": spec.page_size,
                "after": after,
                "query": spec.product_query,
                "publications": PUBLICATIONS_PER_PRODUCT,
            }),
        ),
    };

    RequestBody { query, variables }
}

// Wire types

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct ErrorExtensions {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Data {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductConnection {
    page_info: PageInfo,
    edges: Vec<Edge<ProductNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    variants: Option<Connection<VariantNode>>,
    #[serde(default)]
    resource_publications: Option<Connection<ResourcePublication>>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    #[serde(default)]
    metafield: Option<Metafield>,
}

#[derive(Debug, Deserialize)]
struct Metafield {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourcePublication {
    is_published: bool,
    publication: Publication,
}

#[derive(Debug, Deserialize)]
struct Publication {
    name: String,
}

/// Decode a products response body into a [`Page`].
///
/// GraphQL `THROTTLED` errors are transient; any other GraphQL error is a
/// rejection. A body that is not the expected shape is a protocol error.
pub fn parse_page(body: &str, source: ChannelSource) -> Result<Page> {
    let response: Response = serde_json::from_str(body)
        .map_err(|e| CatalogError::Protocol(format!("unexpected products payload: {e}")))?;

    if !response.errors.is_empty() {
        return Err(classify_errors(&response.errors));
    }

    let products = response
        .data
        .ok_or_else(|| CatalogError::Protocol("response has neither data nor errors".to_string()))?
        .products;

    let next_cursor = match (products.page_info.has_next_page, products.page_info.end_cursor) {
        (true, Some(cursor)) => Some(ScanCursor::new(cursor)),
        (true, None) => {
            return Err(CatalogError::Protocol(
                "pageInfo.hasNextPage is true but endCursor is missing".to_string(),
            ))
        }
        (false, _) => None,
    };

    let products = products
        .edges
        .into_iter()
        .map(|edge| to_product(edge.node, source))
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(products, next_cursor))
}

fn classify_errors(errors: &[GraphqlError]) -> CatalogError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let throttled = errors.iter().any(|e| {
        e.extensions
            .as_ref()
            .and_then(|ext| ext.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
    });

    if throttled {
        CatalogError::transient(format!("throttled: {message}"))
    } else {
        CatalogError::Rejected {
            status: None,
            message,
        }
    }
}

fn to_product(node: ProductNode, source: ChannelSource) -> Result<Product> {
    let id = ProductId::from_upstream(&node.id)
        .map_err(|e| CatalogError::Protocol(format!("bad product id '{}': {e}", node.id)))?;

    let channel_names = match source {
        ChannelSource::VariantMetafields => {
            let variants = node.variants.ok_or_else(|| {
                CatalogError::Protocol(format!("product {id} is missing variants"))
            })?;
            variant_channels(&id, variants)
        }
        ChannelSource::Publications => {
            let publications = node.resource_publications.ok_or_else(|| {
                CatalogError::Protocol(format!("product {id} is missing resourcePublications"))
            })?;
            publications
                .edges
                .into_iter()
                .filter(|edge| edge.node.is_published)
                .map(|edge| edge.node.publication.name)
                .collect()
        }
    };

    Ok(Product {
        id,
        vendor: node.vendor.unwrap_or_default(),
        channel_names,
    })
}

/// Union of the JSON channel lists stored on each variant.
fn variant_channels(id: &ProductId, variants: Connection<VariantNode>) -> BTreeSet<String> {
    let mut channels = BTreeSet::new();

    for value in variants
        .edges
        .into_iter()
        .filter_map(|edge| edge.node.metafield.and_then(|m| m.value))
    {
        match serde_json::from_str::<Vec<String>>(&value) {
            Ok(names) => channels.extend(names),
            Err(e) => {
                tracing::warn!(product_id = %id, "Ignoring unparsable variant channel list: {}", e);
            }
        }
    }

    channels
}
