use crate::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use peermap_core::config::RateLimitConfig;
use peermap_core::{NodeRegistry, RegistryError};
use peermap_services::ClientRecord;

/// Reads through to a client registry unless switched off.
#[derive(Clone)]
struct SwitchedRegistry {
    inner: ClientRegistry,
    down: Arc<AtomicBool>,
}

impl NodeRegistry for SwitchedRegistry {
    type Client = ClientRecord;

    fn clients(&self) -> std::result::Result<Vec<ClientRecord>, RegistryError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("beacon pool offline".into()));
        }
        self.inner.clients()
    }
}

#[tokio::test]
async fn test_empty_registry() {
    let api = spawn_api().await.unwrap();

    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["client_count"], 0);
    assert!(page["clients"].as_array().unwrap().is_empty());
    assert!(page["peer_map"]["nodes"].as_array().unwrap().is_empty());
    assert_eq!(page["cache_ttl_secs"], 12);
}

#[tokio::test]
async fn test_report_then_read() {
    let api = spawn_api().await.unwrap();

    let (status, body) = api
        .put_report(report("lighthouse-1", "16Uiu2HAmLighthouse", &[]))
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["index"], 0);

    let (_, body) = api
        .put_report(report("prysm-1", "16Uiu2HAmPrysm", &[]))
        .await
        .unwrap();
    assert_eq!(body["index"], 1);

    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["client_count"], 2);

    let clients = page["clients"].as_array().unwrap();
    assert_eq!(clients[0]["index"], 1);
    assert_eq!(clients[0]["name"], "lighthouse-1");
    assert_eq!(clients[0]["peer_id"], "16Uiu2HAmLighthouse");
    assert_eq!(clients[0]["head_slot"], 100);
    assert_eq!(clients[0]["head_root"], "0xaa");
    assert!(clients[0]["last_error"].is_null());
    assert_eq!(clients[1]["index"], 2);
    assert_eq!(clients[1]["name"], "prysm-1");
}

#[tokio::test]
async fn test_unsynced_head_shows_zero() {
    let api = spawn_api().await.unwrap();

    let mut r = report("teku-1", "16Uiu2HAmTeku", &[]);
    r["head"]["slot"] = json!(-1);
    api.put_report(r).await.unwrap();

    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["clients"][0]["head_slot"], 0);
}

#[tokio::test]
async fn test_page_is_cached_until_refresh() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[]))
        .await
        .unwrap();

    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["clients"][0]["head_slot"], 100);

    // Direct registry update does not invalidate the cached page.
    assert!(api.state.registry.update_head("lighthouse-1", 200, "0xbb"));
    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["clients"][0]["head_slot"], 100);

    let page = api.get_ok("/clients?refresh=true").await.unwrap();
    assert_eq!(page["clients"][0]["head_slot"], 200);
    assert_eq!(page["clients"][0]["head_root"], "0xbb");
}

#[tokio::test]
async fn test_report_invalidates_page() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[]))
        .await
        .unwrap();
    assert_eq!(api.get_ok("/clients").await.unwrap()["client_count"], 1);

    api.put_report(report("prysm-1", "B-peer-id-0002", &[]))
        .await
        .unwrap();
    assert_eq!(api.get_ok("/clients").await.unwrap()["client_count"], 2);
}

#[tokio::test]
async fn test_report_name_must_match_path() {
    let api = spawn_api().await.unwrap();

    let resp = reqwest::Client::new()
        .put(format!("{}/clients/other", api.base))
        .json(&report("lighthouse-1", "A-peer-id-0001", &[]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert!(api.state.registry.is_empty());
}

#[tokio::test]
async fn test_remove_client() {
    let api = spawn_api().await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[]))
        .await
        .unwrap();
    assert_eq!(api.get_ok("/clients").await.unwrap()["client_count"], 1);

    let (status, body) = api.delete("lighthouse-1").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["removed"], "lighthouse-1");
    assert_eq!(api.get_ok("/clients").await.unwrap()["client_count"], 0);

    let (status, body) = api.delete("lighthouse-1").await.unwrap();
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("lighthouse-1"));
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_calls() {
    let api = spawn_api_with(RateLimitConfig {
        enabled: true,
        calls_per_second: 0.01,
        burst: 2.0,
    })
    .await
    .unwrap();

    assert_eq!(api.get("/clients").await.unwrap().0, 200);
    assert_eq!(api.get("/clients").await.unwrap().0, 200);

    let (status, body) = api.get("/clients").await.unwrap();
    assert_eq!(status, 429);
    assert!(body["error"].is_string());

    // Reports are not rate-limited.
    let (status, _) = api
        .put_report(report("lighthouse-1", "A-peer-id-0001", &[]))
        .await
        .unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_registry_failure_returns_503() {
    let registry = ClientRegistry::new();
    let down = Arc::new(AtomicBool::new(true));
    let source = SwitchedRegistry {
        inner: registry.clone(),
        down: down.clone(),
    };
    let api = spawn_api_over(registry, source).await.unwrap();

    let (status, body) = api.get("/clients").await.unwrap();
    assert_eq!(status, 503);
    assert!(body["error"].as_str().unwrap().contains("beacon pool offline"));

    let (status, _) = api.get("/clients/topology").await.unwrap();
    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_failed_refresh_keeps_cached_page() {
    let registry = ClientRegistry::new();
    let down = Arc::new(AtomicBool::new(false));
    let source = SwitchedRegistry {
        inner: registry.clone(),
        down: down.clone(),
    };
    let api = spawn_api_over(registry, source).await.unwrap();
    api.put_report(report("lighthouse-1", "A-peer-id-0001", &[]))
        .await
        .unwrap();
    assert_eq!(api.get_ok("/clients").await.unwrap()["client_count"], 1);

    down.store(true, Ordering::SeqCst);
    let (status, _) = api.get("/clients?refresh=true").await.unwrap();
    assert_eq!(status, 503);

    let page = api.get_ok("/clients").await.unwrap();
    assert_eq!(page["client_count"], 1);
    assert_eq!(page["cache_ttl_secs"], 12);
}
