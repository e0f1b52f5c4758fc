//! Integration tests for the JWKS discovery endpoint

use mock_idp_service::models::Jwks;
use mock_idp_test_utils::{KeyRole, TestIdpServer};
use reqwest::StatusCode;

#[tokio::test]
async fn test_jwks_publishes_only_current_key() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIdpServer::spawn().await?;

    // Act
    let response = reqwest::get(format!("{}/.well-known/jwks.json", server.url())).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap_or_default()),
        Some("max-age=3600")
    );

    let jwks: Jwks = response.json().await?;
    assert_eq!(jwks.keys, vec![server.public_key(KeyRole::Current).await]);

    let expired = server.public_key(KeyRole::Expired).await;
    assert!(
        jwks.keys.iter().all(|key| key.n != expired.n),
        "Expired key must never be published"
    );

    Ok(())
}

#[tokio::test]
async fn test_jwks_document_has_no_private_fields() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let body: serde_json::Value = reqwest::get(format!("{}/.well-known/jwks.json", server.url()))
        .await?
        .json()
        .await?;

    let key = body["keys"]
        .as_array()
        .and_then(|keys| keys.first())
        .and_then(|key| key.as_object())
        .ok_or_else(|| anyhow::anyhow!("JWKS must contain one key object"))?;

    for private in ["d", "p", "q", "dp", "dq", "qi"] {
        assert!(!key.contains_key(private), "JWK leaks '{}'", private);
    }
    assert_eq!(key.get("kid"), Some(&serde_json::json!("current")));
    assert_eq!(key.get("kty"), Some(&serde_json::json!("RSA")));

    Ok(())
}

#[tokio::test]
async fn test_jwks_before_provisioning_returns_500() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn_unprovisioned().await?;

    let response = reqwest::get(format!("{}/.well-known/jwks.json", server.url())).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "KEY_NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_jwks_rejects_other_methods() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/.well-known/jwks.json", server.url());

    for method in [
        reqwest::Method::HEAD,
        reqwest::Method::PUT,
        reqwest::Method::POST,
        reqwest::Method::DELETE,
        reqwest::Method::PATCH,
    ] {
        let response = client.request(method.clone(), &url).send().await?;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{} should be rejected",
            method
        );
    }

    Ok(())
}
