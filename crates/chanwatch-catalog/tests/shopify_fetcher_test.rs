//! ShopifyFetcher against a scripted local HTTP server.

use chanwatch_catalog::{CatalogError, PageFetcher, RetryPolicy, ShopifyFetcher};
use chanwatch_core::{CatalogConfig, ChannelSource, ScanCursor};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the scripted server.
#[derive(Debug, Clone)]
struct Captured {
    head: String,
    body: String,
}

/// Serve the given `(status, body)` responses in order, one per connection.
async fn scripted_server(
    responses: Vec<(u16, String)>,
) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&captured);

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            log.lock().expect("capture lock").push(request);

            let response = format!(
                "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}/admin/api/2023-10/graphql.json"), captured)
}

async fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        head,
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    }
}

fn fetcher(endpoint: &str, max_attempts: u32) -> ShopifyFetcher {
    let config = CatalogConfig {
        shop_domain: "example.myshopify.com".to_string(),
        access_token: Some("shpat_test".to_string()),
        channel_source: ChannelSource::VariantMetafields,
        ..CatalogConfig::default()
    };
    ShopifyFetcher::from_config(&config, 2)
        .expect("build fetcher")
        .with_endpoint(endpoint)
        .with_retry_policy(RetryPolicy::new(max_attempts, Duration::from_millis(10)))
}

fn products_page(has_next: bool, end_cursor: Option<&str>) -> String {
    serde_json::json!({
        "data": {
            "products": {
                "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
                "edges": [
                    {
                        "node": {
                            "id": "gid://shopify/Product/1",
                            "vendor": "Acme",
                            "variants": { "edges": [
                                { "node": { "metafield": { "value": "[\"Online Store\"]" } } }
                            ] }
                        }
                    },
                    {
                        "node": {
                            "id": "gid://shopify/Product/2",
                            "vendor": "Zenith",
                            "variants": { "edges": [
                                { "node": { "metafield": null } }
                            ] }
                        }
                    }
                ]
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_fetches_and_decodes_page() {
    let (endpoint, captured) =
        scripted_server(vec![(200, products_page(true, Some("cursor-2")))]).await;

    let page = fetcher(&endpoint, 3)
        .fetch_page(None)
        .await
        .expect("fetch page");

    assert_eq!(page.products.len(), 2);
    assert_eq!(page.products[0].id.as_str(), "1");
    assert!(page.products[0].channel_names.contains("Online Store"));
    assert!(page.products[1].channel_names.is_empty());
    assert_eq!(page.next_cursor, Some(ScanCursor::new("cursor-2")));

    let requests = captured.lock().expect("capture lock").clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].head.starts_with("POST /admin/api/2023-10/graphql.json"));
    assert!(requests[0]
        .head
        .to_ascii_lowercase()
        .contains("x-shopify-access-token: shpat_test"));
}

#[tokio::test]
async fn test_cursor_sent_as_after_variable() {
    let (endpoint, captured) = scripted_server(vec![(200, products_page(false, None))]).await;

    let page = fetcher(&endpoint, 3)
        .fetch_page(Some(&ScanCursor::new("resume-here")))
        .await
        .expect("fetch page");
    assert!(!page.has_more());

    let requests = captured.lock().expect("capture lock").clone();
    let body: serde_json::Value =
        serde_json::from_str(&requests[0].body).expect("request body is JSON");
    assert_eq!(body["variables"]["after"], "resume-here");
    assert_eq!(body["variables"]["first"], 2);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (endpoint, captured) = scripted_server(vec![
        (503, "{}".to_string()),
        (200, products_page(false, None)),
    ])
    .await;

    let page = fetcher(&endpoint, 3)
        .fetch_page(None)
        .await
        .expect("second attempt succeeds");

    assert_eq!(page.products.len(), 2);
    assert_eq!(captured.lock().expect("capture lock").len(), 2);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let (endpoint, captured) = scripted_server(vec![
        (401, r#"{"errors":"[API] Invalid API key or access token"}"#.to_string()),
        (200, products_page(false, None)),
    ])
    .await;

    let err = fetcher(&endpoint, 3)
        .fetch_page(None)
        .await
        .expect_err("rejected");

    assert!(matches!(err, CatalogError::Rejected { status: Some(401), .. }));
    assert_eq!(captured.lock().expect("capture lock").len(), 1);
}

#[tokio::test]
async fn test_persistent_throttling_exhausts_retries() {
    let throttled = r#"{"errors":[{"message":"Throttled","extensions":{"code":"THROTTLED"}}]}"#;
    let (endpoint, captured) = scripted_server(vec![
        (200, throttled.to_string()),
        (200, throttled.to_string()),
    ])
    .await;

    let err = fetcher(&endpoint, 2)
        .fetch_page(None)
        .await
        .expect_err("throttled twice");

    assert!(matches!(err, CatalogError::RetriesExhausted { attempts: 2, .. }));
    assert_eq!(captured.lock().expect("capture lock").len(), 2);
}

#[tokio::test]
async fn test_malformed_payload_is_protocol_error() {
    let (endpoint, _captured) =
        scripted_server(vec![(200, r#"{"data":{"products":{"edges":[]}}}"#.to_string())]).await;

    let err = fetcher(&endpoint, 3)
        .fetch_page(None)
        .await
        .expect_err("missing pageInfo");

    assert!(matches!(err, CatalogError::Protocol(_)));
}
