//! Keep-alive endpoint contract.

use std::sync::Arc;

use serde_json::Value;
use waitlist_gate::persistence::MemoryGateway;

mod common;

#[tokio::test]
async fn test_requires_bearer_secret() {
    let addr = common::spawn_app(common::test_config(), Some(Arc::new(MemoryGateway::new()))).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/ping", addr);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(&url)
        .header("authorization", "Bearer wrong-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // The scheme matters too.
    let response = client
        .get(&url)
        .header("authorization", common::CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_ping_reports_count_and_logs() {
    let store = Arc::new(MemoryGateway::new());
    let addr = common::spawn_app(common::test_config(), Some(store.clone())).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/api/ping", addr))
        .header("authorization", format!("Bearer {}", common::CRON_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Ping successful");
    assert_eq!(body["count"], 0);

    let pings = store.pings();
    assert_eq!(pings.len(), 1);
    assert_eq!(pings[0].status, "success");
}

#[tokio::test]
async fn test_ping_supports_post() {
    let addr = common::spawn_app(common::test_config(), Some(Arc::new(MemoryGateway::new()))).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/api/ping", addr))
        .header("authorization", format!("Bearer {}", common::CRON_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_ping_demo_mode_without_store() {
    let addr = common::spawn_app(common::test_config(), None).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/api/ping", addr))
        .header("authorization", format!("Bearer {}", common::CRON_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("Demo mode"));
}

#[tokio::test]
async fn test_disabled_keepalive_has_no_route() {
    let mut config = common::test_config();
    config.keepalive.enabled = false;
    let addr = common::spawn_app(config, Some(Arc::new(MemoryGateway::new()))).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/api/ping", addr))
        .header("authorization", format!("Bearer {}", common::CRON_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
