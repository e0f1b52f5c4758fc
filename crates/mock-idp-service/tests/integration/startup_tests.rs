//! Integration tests for startup provisioning
//!
//! Covers both startup modes: `immediate`, where the listener serves while keys
//! are still being generated, and `gated`, where keys exist before the first
//! request can arrive.

use mock_idp_service::config::StartupMode;
use mock_idp_test_utils::{
    FailingKeyGenerator, FixtureKeyGenerator, HeldKeyGenerator, KeyRole, TestIdpServer,
    TokenAssertions,
};
use reqwest::StatusCode;
use std::sync::Arc;

#[tokio::test]
async fn test_immediate_mode_serves_500_until_keys_exist() -> Result<(), anyhow::Error> {
    // Arrange
    let generator = Arc::new(HeldKeyGenerator::new());
    // Any early return below must still unpark the provisioning threads
    let release = generator.release_on_drop();
    let mut server =
        TestIdpServer::spawn_with_generator(generator.clone(), StartupMode::Immediate).await?;
    let client = reqwest::Client::new();

    // Act: requests race ahead of key generation
    let token_response = client.post(format!("{}/auth", server.url())).send().await?;
    let jwks_response = client
        .get(format!("{}/.well-known/jwks.json", server.url()))
        .send()
        .await?;
    let ready_response = client.get(format!("{}/ready", server.url())).send().await?;

    drop(release);
    let report = server.wait_for_provisioning().await?;

    // Assert
    assert_eq!(token_response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(jwks_response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ready_response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(report.is_complete());

    let response = client.post(format!("{}/auth", server.url())).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await?.assert_signed_by("current");

    let response = client.get(format!("{}/ready", server.url())).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_gated_mode_is_ready_on_first_request() -> Result<(), anyhow::Error> {
    let mut server =
        TestIdpServer::spawn_with_generator(Arc::new(FixtureKeyGenerator), StartupMode::Gated)
            .await?;

    let report = server.wait_for_provisioning().await?;
    assert!(report.is_complete());

    let response = reqwest::Client::new()
        .post(format!("{}/auth?expired=1", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await?.assert_signed_by("expired");

    Ok(())
}

#[tokio::test]
async fn test_failed_generation_leaves_other_role_working() -> Result<(), anyhow::Error> {
    // Arrange
    let mut server = TestIdpServer::spawn_with_generator(
        Arc::new(FailingKeyGenerator::for_roles(&[KeyRole::Expired])),
        StartupMode::Gated,
    )
    .await?;
    let client = reqwest::Client::new();

    // Act
    let report = server.wait_for_provisioning().await?;

    // Assert
    assert_eq!(report.provisioned, vec![KeyRole::Current]);
    assert_eq!(report.failed, vec![KeyRole::Expired]);

    let response = client
        .get(format!("{}/.well-known/jwks.json", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.post(format!("{}/auth", server.url())).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/auth?expired=1", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = client.get(format!("{}/ready", server.url())).send().await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn test_provisioned_keys_use_role_as_kid() -> Result<(), anyhow::Error> {
    let server = TestIdpServer::spawn().await?;

    for role in KeyRole::ALL {
        let key = server
            .key_store()
            .get(role)
            .await
            .ok_or_else(|| anyhow::anyhow!("{} key missing", role))?;
        assert_eq!(key.kid(), role.as_str());
        assert_eq!(key.role(), role);
    }

    Ok(())
}
