use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role a signing key plays in token issuance.
///
/// Each role maps to exactly one key in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Signs tokens that are still valid. The only key published in the JWKS.
    Current,
    /// Signs tokens that are issued already expired.
    Expired,
}

impl KeyRole {
    pub const ALL: [KeyRole; 2] = [KeyRole::Current, KeyRole::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Current => "current",
            KeyRole::Expired => "expired",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON Web Key Set (RFC 7517)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<JsonWebKey>,
}

/// Public projection of an RSA signing key.
///
/// Only the modulus and public exponent are carried. There are deliberately no
/// fields for `d`, `p`, `q` or the CRT parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    /// Modulus, base64url without padding.
    pub n: String,
    /// Public exponent, base64url without padding.
    pub e: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

/// Protected header of issued tokens.
///
/// `exp` is duplicated from the claims so verifiers can reject a stale token
/// before decoding the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: Algorithm,
    pub kid: String,
    pub exp: i64,
}

/// Claim set every token is built from, minus `exp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimsTemplate(Map<String, Value>);

impl ClaimsTemplate {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Fixed mock identity handed out by `POST /auth`.
    pub fn mock_identity() -> Self {
        let mut fields = Map::new();
        fields.insert("username".to_string(), Value::from("user"));
        fields.insert("password".to_string(), Value::from("password"));
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Build a fresh claim set with the given expiry.
    ///
    /// The template is copied, so callers never share a map. Any `exp` already in
    /// the template is dropped in favour of the computed one.
    pub fn to_claims(&self, exp: i64) -> Claims {
        let mut fields = self.0.clone();
        fields.remove("exp");
        Claims { fields, exp }
    }
}

/// Claims carried in the token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Readiness probe body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub current_key: &'static str,
    pub expired_key: &'static str,
}
