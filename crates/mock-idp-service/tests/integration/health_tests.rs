//! Integration tests for health probes and the metrics endpoint

use mock_idp_test_utils::{KeyRole, TestIdpServer};
use reqwest::StatusCode;

// ============================================================================
// Liveness Probe Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Liveness does not depend on keys
    let server = TestIdpServer::spawn_unprovisioned().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

// ============================================================================
// Readiness Probe Tests
// ============================================================================

#[tokio::test]
async fn test_ready_endpoint_returns_ok_when_provisioned() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["current_key"], "available");
    assert_eq!(body["expired_key"], "available");

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_tracks_provisioning() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn_unprovisioned().await?;
    let url = format!("{}/ready", server.url());

    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");

    server.register_fixture_keys(&[KeyRole::Current]).await;
    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["current_key"], "available");
    assert_eq!(body["expired_key"], "unavailable");

    server.register_fixture_keys(&[KeyRole::Expired]).await;
    let response = reqwest::get(&url).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

// ============================================================================
// Metrics Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    reqwest::Client::new()
        .post(format!("{}/auth", server.url()))
        .send()
        .await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Only one test server per process owns the global recorder, so the body
    // may be empty here; it must still be valid Prometheus text.
    let body = response.text().await?;
    assert!(body
        .lines()
        .all(|line| line.is_empty() || line.starts_with('#') || line.starts_with("idp_")));

    Ok(())
}
