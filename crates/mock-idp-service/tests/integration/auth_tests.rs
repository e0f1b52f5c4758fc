//! Integration tests for token issuance

use mock_idp_service::models::Jwks;
use mock_idp_test_utils::{KeyRole, TestIdpServer, TokenAssertions};
use reqwest::StatusCode;

async fn issue(server: &TestIdpServer, query: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/auth{}", server.url(), query))
        .send()
        .await?)
}

async fn issue_token(server: &TestIdpServer, query: &str) -> Result<String, anyhow::Error> {
    let response = issue(server, query).await?;
    assert_eq!(response.status(), StatusCode::OK, "query '{}'", query);
    Ok(response.text().await?)
}

#[tokio::test]
async fn test_valid_token_signed_by_current_key() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIdpServer::spawn().await?;
    let current = server.public_key(KeyRole::Current).await;
    let expired = server.public_key(KeyRole::Expired).await;

    // Act
    let token = issue_token(&server, "").await?;

    // Assert
    token
        .assert_valid_jwt()
        .assert_signed_by("current")
        .assert_header_exp_matches_claims()
        .assert_expires_in(3600)
        .assert_mock_identity()
        .assert_verifies_with(&current)
        .assert_rejected_by(&expired);

    Ok(())
}

#[tokio::test]
async fn test_expired_token_signed_by_expired_key() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;
    let current = server.public_key(KeyRole::Current).await;
    let expired = server.public_key(KeyRole::Expired).await;

    let token = issue_token(&server, "?expired=1").await?;

    token
        .assert_valid_jwt()
        .assert_signed_by("expired")
        .assert_header_exp_matches_claims()
        .assert_expired_about(1000)
        .assert_mock_identity()
        .assert_verifies_with(&expired)
        .assert_rejected_by(&current);

    Ok(())
}

#[tokio::test]
async fn test_expired_token_cannot_be_verified_from_jwks() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let jwks: Jwks = reqwest::get(format!("{}/.well-known/jwks.json", server.url()))
        .await?
        .json()
        .await?;
    let published = jwks
        .keys
        .first()
        .ok_or_else(|| anyhow::anyhow!("JWKS must not be empty"))?;

    issue_token(&server, "").await?.assert_verifies_with(published);
    issue_token(&server, "?expired=yes")
        .await?
        .assert_rejected_by(published);

    Ok(())
}

#[tokio::test]
async fn test_expired_parameter_truthiness() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let cases = [
        ("", "current"),
        ("?expired", "current"),
        ("?expired=", "current"),
        ("?expired=1", "expired"),
        ("?expired=true", "expired"),
        ("?expired=false", "expired"),
        ("?expired=0", "expired"),
        ("?expired=&expired=1", "expired"),
        ("?other=1", "current"),
    ];

    for (query, kid) in cases {
        issue_token(&server, query).await?.assert_signed_by(kid);
    }

    Ok(())
}

#[tokio::test]
async fn test_request_body_is_ignored() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/auth", server.url()))
        .json(&serde_json::json!({"username": "someone-else", "exp": 1}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    response
        .text()
        .await?
        .assert_mock_identity()
        .assert_expires_in(3600);

    Ok(())
}

#[tokio::test]
async fn test_each_request_gets_fresh_expiry() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    let valid = issue_token(&server, "").await?;
    let expired = issue_token(&server, "?expired=1").await?;
    let valid_again = issue_token(&server, "").await?;

    valid.assert_expires_in(3600);
    expired.assert_expired_about(1000);
    valid_again.assert_expires_in(3600);

    Ok(())
}

#[tokio::test]
async fn test_auth_rejects_other_methods() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/auth", server.url());

    for method in [
        reqwest::Method::GET,
        reqwest::Method::PUT,
        reqwest::Method::DELETE,
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

#[tokio::test]
async fn test_missing_key_returns_500_and_server_keeps_running() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn_unprovisioned().await?;
    server.register_fixture_keys(&[KeyRole::Current]).await;

    // The expired role was never provisioned
    let response = issue(&server, "?expired=1").await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "KEY_NOT_FOUND");

    // The other role is unaffected
    issue_token(&server, "").await?.assert_signed_by("current");

    Ok(())
}
