//! End-to-end tests against a live proxy and a mock upstream.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use bandwidth_hero_proxy::compress::{Compressed, CompressError, Compressor};
use bandwidth_hero_proxy::http::EventResponse;
use bandwidth_hero_proxy::request::CompressionOptions;
use bandwidth_hero_proxy::{Pipeline, ProxyConfig};
use common::{
    client, noisy_png, start_mock_upstream, start_proxy, start_proxy_with, MockResponse,
};

/// Returns a fixed-size body after an optional delay, overriding only
/// `content-type`.
struct PlainCompressor {
    output_size: usize,
    delay: Duration,
}

impl Compressor for PlainCompressor {
    fn compress(
        &self,
        _input: &[u8],
        _options: CompressionOptions,
        _original_size: usize,
    ) -> Result<Compressed, CompressError> {
        std::thread::sleep(self.delay);
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/webp"));
        Ok(Compressed {
            output: vec![9u8; self.output_size],
            headers,
        })
    }
}

fn invoke_body(target: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "queryStringParameters": {"url": target},
        "headers": {"host": "proxy.example"}
    }))
    .unwrap()
}

fn proxied(proxy: std::net::SocketAddr, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("http://{}/?url={}", proxy, encoded)
}

#[tokio::test]
async fn test_identity_without_url() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "bandwidth-hero-proxy");
    shutdown.trigger();
}

#[tokio::test]
async fn test_non_image_is_bypassed() {
    let (upstream, _) =
        start_mock_upstream(MockResponse::ok("text/plain", b"just some text".to_vec())).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/file.txt", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    assert_eq!(response.headers().get("x-proxy-bypass").unwrap(), "1");
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"just some text");
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let (upstream, _) = start_mock_upstream(MockResponse::status(404)).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/missing.png", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert!(response.bytes().await.unwrap().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    // Reserve a port, then free it so nothing is listening there.
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/a.png", closed)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert!(!response.text().await.unwrap().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn test_forwards_allow_listed_headers_only() {
    let (upstream, received) =
        start_mock_upstream(MockResponse::ok("text/plain", b"ok".to_vec())).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    client()
        .get(proxied(proxy, &format!("http://{}/a.png", upstream)))
        .header("referer", "http://reader.example/")
        .header("authorization", "Bearer secret")
        .send()
        .await
        .unwrap();

    let heads = received.lock().unwrap();
    let head = heads[0].to_ascii_lowercase();
    assert!(head.contains("referer: http://reader.example/"));
    assert!(!head.contains("authorization"));
    shutdown.trigger();
}

#[tokio::test]
async fn test_png_recompressed_to_webp() {
    let png = noisy_png(64, 64);
    let original_len = png.len();
    let (upstream, _) = start_mock_upstream(
        MockResponse::ok("image/png", png).with_header("Cache-Control", "max-age=60"),
    )
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/noise.png", upstream)))
        .header("x-image-lite-bw", "0")
        .header("x-image-lite-level", "30")
        .header("x-image-lite-jpeg", "0")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(headers.get("content-type").unwrap(), "image/webp");
    assert_eq!(headers.get("cache-control").unwrap(), "max-age=60");
    assert_eq!(
        headers.get("x-original-size").unwrap(),
        original_len.to_string().as_str()
    );
    assert!(headers.get("x-proxy-bypass").is_none());

    let body = response.bytes().await.unwrap();
    assert_eq!(&body[0..4], b"RIFF");
    assert_eq!(&body[8..12], b"WEBP");
    assert_eq!(
        headers.get("content-length").unwrap(),
        body.len().to_string().as_str()
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_default_options_produce_grayscale_jpeg() {
    let (upstream, _) = start_mock_upstream(MockResponse::ok("image/png", noisy_png(200, 200))).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/noise.png", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[0..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!(decoded.color(), image::ColorType::L8);
    shutdown.trigger();
}

#[tokio::test]
async fn test_event_invocation_returns_base64_image() {
    let png = noisy_png(64, 64);
    let (upstream, _) = start_mock_upstream(MockResponse::ok("image/png", png)).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let event = serde_json::json!({
        "queryStringParameters": {"url": format!("http://{}/noise.png", upstream)},
        "headers": {
            "host": "proxy.example",
            "x-image-lite-bw": "1",
            "x-image-lite-level": "50",
            "x-image-lite-jpeg": "0"
        }
    });

    let response = client()
        .post(format!("http://{}/invoke", proxy))
        .header("content-type", "application/json")
        .body(serde_json::to_vec(&event).unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let result: EventResponse = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(result.status_code, 200);
    assert_eq!(result.is_base64_encoded, Some(true));
    assert_eq!(
        result.headers.unwrap().get("content-type").map(String::as_str),
        Some("image/webp")
    );
    let body = STANDARD.decode(result.body).unwrap();
    assert_eq!(&body[0..4], b"RIFF");
    shutdown.trigger();
}

#[tokio::test]
async fn test_event_invocation_without_url() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .post(format!("http://{}/invoke", proxy))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();

    let result: EventResponse = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, "bandwidth-hero-proxy");
    assert!(result.headers.is_none());
    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let response = client()
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_upstream_times_out_as_500() {
    let (upstream, _) = start_mock_upstream(
        MockResponse::ok("image/png", noisy_png(16, 16)).with_delay(Duration::from_secs(3)),
    )
    .await;
    let mut config = ProxyConfig::default();
    config.timeouts.fetch_secs = 1;
    let (proxy, shutdown) = start_proxy(config).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/slow.png", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "upstream fetch timed out after 1 seconds"
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_request_timeout_goes_through_both_adapters() {
    let (upstream, _) =
        start_mock_upstream(MockResponse::ok("image/jpeg", vec![7u8; 5000])).await;
    let mut config = ProxyConfig::default();
    config.timeouts.request_secs = 1;
    config.timeouts.compress_secs = 5;
    let pipeline = Pipeline::from_config(&config)
        .unwrap()
        .with_compressor(Arc::new(PlainCompressor {
            output_size: 10,
            delay: Duration::from_secs(2),
        }));
    let (proxy, shutdown) = start_proxy_with(config, pipeline).await;
    let target = format!("http://{}/a.jpg", upstream);

    let direct = client().get(proxied(proxy, &target)).send().await.unwrap();
    assert_eq!(direct.status(), 500);
    assert_eq!(direct.text().await.unwrap(), "request timed out after 1 seconds");

    let invoked = client()
        .post(format!("http://{}/invoke", proxy))
        .header("content-type", "application/json")
        .body(invoke_body(&target))
        .send()
        .await
        .unwrap();
    assert_eq!(invoked.status(), 200);
    let result: EventResponse = serde_json::from_slice(&invoked.bytes().await.unwrap()).unwrap();
    assert_eq!(result.status_code, 500);
    assert_eq!(result.body, "request timed out after 1 seconds");
    shutdown.trigger();
}

#[tokio::test]
async fn test_compressor_without_length_override_is_framed_correctly() {
    let (upstream, _) =
        start_mock_upstream(MockResponse::ok("image/jpeg", vec![7u8; 5000])).await;
    let config = ProxyConfig::default();
    let pipeline = Pipeline::from_config(&config)
        .unwrap()
        .with_compressor(Arc::new(PlainCompressor {
            output_size: 500,
            delay: Duration::ZERO,
        }));
    let (proxy, shutdown) = start_proxy_with(config, pipeline).await;

    let response = client()
        .get(proxied(proxy, &format!("http://{}/a.jpg", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/webp");
    assert_eq!(response.headers().get("content-length").unwrap(), "500");
    assert_eq!(response.bytes().await.unwrap().len(), 500);
    shutdown.trigger();
}
