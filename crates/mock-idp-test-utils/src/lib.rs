//! # Mock IdP Test Utilities
//!
//! Shared test utilities for the mock identity provider.
//!
//! This crate provides:
//! - RSA key fixtures (generated once per test binary) and key generators
//!   for driving provisioning in tests
//! - Server test harness (TestIdpServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mock_idp_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestIdpServer::spawn().await?;
//!     let token = reqwest::Client::new()
//!         .post(format!("{}/auth", server.url()))
//!         .send()
//!         .await?
//!         .text()
//!         .await?;
//!
//!     token
//!         .assert_valid_jwt()
//!         .assert_signed_by("current")
//!         .assert_verifies_with(&server.public_key(KeyRole::Current).await);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;

pub use mock_idp_service::models::KeyRole;
