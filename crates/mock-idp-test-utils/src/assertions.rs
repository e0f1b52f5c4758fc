//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mock_idp_service::models::JsonWebKey;
use serde::Deserialize;
use serde_json::Value;

/// Allowed drift between the server's clock reading and the test's.
const CLOCK_TOLERANCE_SECONDS: i64 = 5;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
    kid: Option<String>,
    exp: Option<i64>,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

fn header(token: &str) -> JwtHeader {
    serde_json::from_slice(&segment(token, 0)).expect("Failed to parse JWT header")
}

fn claims(token: &str) -> Value {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

fn claims_exp(token: &str) -> i64 {
    claims(token)["exp"]
        .as_i64()
        .expect("JWT claims must carry a numeric exp")
}

fn verify(token: &str, jwk: &JsonWebKey) -> Result<Value, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
    let mut validation = Validation::new(Algorithm::RS256);
    // Expired tokens are issued on purpose; only the signature is checked here
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<Value>(token, &key, &validation).map(|data| data.claims)
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_signed_by("expired")
///     .assert_expired_about(1000)
///     .assert_verifies_with(&expired_jwk)
///     .assert_rejected_by(&current_jwk);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed RS256 JWT with a `kid`
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the header `kid`
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the header `exp` equals the claims `exp`
    fn assert_header_exp_matches_claims(&self) -> &Self;

    /// Assert that the token expires roughly `seconds` from now
    fn assert_expires_in(&self, seconds: i64) -> &Self;

    /// Assert that the token expired roughly `seconds` ago
    fn assert_expired_about(&self, seconds: i64) -> &Self;

    /// Assert the fixed mock identity claims
    fn assert_mock_identity(&self) -> &Self;

    /// Assert that the signature verifies with the given public key
    fn assert_verifies_with(&self, jwk: &JsonWebKey) -> &Self;

    /// Assert that the signature does not verify with the given public key
    fn assert_rejected_by(&self, jwk: &JsonWebKey) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header = header(self);
        assert_eq!(header.alg, "RS256", "Expected RS256 algorithm");
        assert!(header.kid.is_some(), "JWT header must carry a kid");

        assert!(claims(self).is_object(), "JWT claims must be a JSON object");

        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let kid = header(self).kid;
        assert_eq!(
            kid.as_deref(),
            Some(key_id),
            "Expected key_id '{}', got {:?}",
            key_id,
            kid
        );

        self
    }

    fn assert_header_exp_matches_claims(&self) -> &Self {
        let header_exp = header(self).exp;
        assert_eq!(
            header_exp,
            Some(claims_exp(self)),
            "Header exp must match claims exp"
        );

        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let expires_in = claims_exp(self) - chrono::Utc::now().timestamp();

        assert!(
            (expires_in - seconds).abs() <= CLOCK_TOLERANCE_SECONDS,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );

        self
    }

    fn assert_expired_about(&self, seconds: i64) -> &Self {
        let expired_for = chrono::Utc::now().timestamp() - claims_exp(self);

        assert!(
            (expired_for - seconds).abs() <= CLOCK_TOLERANCE_SECONDS,
            "Expected token to have expired {} seconds ago, but expired {} seconds ago",
            seconds,
            expired_for
        );

        self
    }

    fn assert_mock_identity(&self) -> &Self {
        let claims = claims(self);
        assert_eq!(claims["username"], "user", "Unexpected username claim");
        assert_eq!(claims["password"], "password", "Unexpected password claim");

        self
    }

    fn assert_verifies_with(&self, jwk: &JsonWebKey) -> &Self {
        if let Err(e) = verify(self, jwk) {
            panic!("Token should verify with key '{}': {}", jwk.kid, e);
        }

        self
    }

    fn assert_rejected_by(&self, jwk: &JsonWebKey) -> &Self {
        assert!(
            verify(self, jwk).is_err(),
            "Token should not verify with key '{}'",
            jwk.kid
        );

        self
    }
}
