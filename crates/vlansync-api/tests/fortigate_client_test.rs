#![allow(clippy::unwrap_used)]
// Integration tests for `FortiGateClient` using wiremock.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vlansync_api::{Error, FortiGateClient, ResponseCache, TransportConfig};

const SWITCH_PATH: &str = "/api/v2/cmdb/switch-controller/managed-switch";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FortiGateClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = FortiGateClient::with_client(reqwest::Client::new(), base_url, None);
    (server, client)
}

fn switch_listing() -> serde_json::Value {
    json!({
        "http_method": "GET",
        "status": "success",
        "http_status": 200,
        "results": [{
            "switch-id": "SW1",
            "ports": [
                {"port-name": "port1", "vlan": "vlan90", "allowed-vlans": [{"vlan-name": "vlan50"}]},
                {"port-name": "port2", "vlan": "_default", "allowed-vlans-all": "enable"}
            ]
        }]
    })
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_managed_switches() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(switch_listing()))
        .mount(&server)
        .await;

    let switches = client.list_managed_switches().await.unwrap();
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].display_name(), Some("SW1"));
    assert_eq!(switches[0].ports.len(), 2);
    assert!(switches[0].ports[1].allows_all_vlans());
}

#[tokio::test]
async fn test_bearer_token_and_vdom_are_sent() {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "fg-token".to_string().into();
    let client = FortiGateClient::new(
        Url::parse(&server.uri()).unwrap(),
        &token,
        Some("root".into()),
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .and(header("authorization", "Bearer fg-token"))
        .and(query_param("vdom", "root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let switches = client.list_managed_switches().await.unwrap();
    assert!(switches.is_empty());
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_managed_switches().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = client.list_managed_switches().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

// ── Cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cached_listing_skips_network() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(switch_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(ResponseCache::open(dir.path(), true).unwrap());
    let client = client.with_cache(cache);

    let first = client.list_managed_switches().await.unwrap();
    let second = client.list_managed_switches().await.unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(second[0].display_name(), Some("SW1"));
}

#[tokio::test]
async fn test_write_only_cache_still_records_fetch() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(SWITCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(switch_listing()))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(ResponseCache::open(dir.path(), false).unwrap());
    let client = client.with_cache(Arc::clone(&cache));

    client.list_managed_switches().await.unwrap();
    client.list_managed_switches().await.unwrap();

    let entries = cache.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].key.starts_with("fortigate_127.0.0.1_"));
    assert!(entries[0].key.ends_with("_managed_switches"));
}
