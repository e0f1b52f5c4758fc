use crate::errors::IdpError;
use crate::models::{Claims, JsonWebKey, KeyRole, TokenHeader};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::fmt;
use tracing::instrument;

/// Smallest RSA modulus accepted for signing keys.
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Largest RSA modulus accepted for signing keys.
///
/// Generation time grows roughly with the fourth power of the size; beyond this
/// startup takes minutes.
pub const MAX_RSA_KEY_BITS: usize = 8192;

/// RSA signing key bound to a role.
///
/// The private half only lives inside `encoding_key` and is never exposed
/// through an accessor. Debug output redacts it.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    role: KeyRole,
    algorithm: Algorithm,
    bits: usize,
    encoding_key: EncodingKey,
    public_jwk: JsonWebKey,
}

impl SigningKey {
    /// Wrap an RSA private key for the given role.
    ///
    /// The key ID is the role name, so `kid` alone tells a verifier which role
    /// signed a token.
    pub fn from_rsa_private_key(
        role: KeyRole,
        private_key: &RsaPrivateKey,
    ) -> Result<Self, IdpError> {
        let bits = private_key.size() * 8;
        if bits < MIN_RSA_KEY_BITS {
            return Err(IdpError::KeyGeneration(format!(
                "RSA key too small: {} bits (minimum {})",
                bits, MIN_RSA_KEY_BITS
            )));
        }

        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| IdpError::KeyGeneration(format!("PKCS#1 encoding failed: {}", e)))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        let kid = role.as_str().to_string();
        let public_jwk = JsonWebKey {
            kty: "RSA".to_string(),
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
            kid: kid.clone(),
            alg: "RS256".to_string(),
            key_use: "sig".to_string(),
        };

        Ok(Self {
            kid,
            role,
            algorithm: Algorithm::RS256,
            bits,
            encoding_key,
            public_jwk,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// JWKS projection of this key (public components only).
    pub fn public_jwk(&self) -> &JsonWebKey {
        &self.public_jwk
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("role", &self.role)
            .field("algorithm", &self.algorithm)
            .field("bits", &self.bits)
            .field("encoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh RSA signing key for a role using the OS CSPRNG.
///
/// CPU-bound (hundreds of milliseconds for 2048 bits). Call from a blocking
/// context.
#[instrument(skip_all, fields(role = %role, bits = bits))]
pub fn generate_signing_key(role: KeyRole, bits: usize) -> Result<SigningKey, IdpError> {
    if !(MIN_RSA_KEY_BITS..=MAX_RSA_KEY_BITS).contains(&bits) {
        return Err(IdpError::KeyGeneration(format!(
            "Unsupported RSA key size: {} (expected {}..={})",
            bits, MIN_RSA_KEY_BITS, MAX_RSA_KEY_BITS
        )));
    }

    let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
        .map_err(|e| IdpError::KeyGeneration(format!("RSA keypair generation failed: {}", e)))?;

    SigningKey::from_rsa_private_key(role, &private_key)
}

/// Sign claims into a compact JWS (`header.payload.signature`).
///
/// The header carries `alg`, `kid` and a copy of the claims' `exp`. Each
/// segment is base64url without padding.
#[instrument(skip_all, fields(kid = %key.kid()))]
pub fn sign_token(claims: &Claims, key: &SigningKey) -> Result<String, IdpError> {
    let header = TokenHeader {
        alg: key.algorithm,
        kid: key.kid.clone(),
        exp: claims.exp,
    };

    let header_json = serde_json::to_vec(&header)
        .map_err(|e| IdpError::Signing(format!("Header encoding failed: {}", e)))?;
    let claims_json = serde_json::to_vec(claims)
        .map_err(|e| IdpError::Signing(format!("Claims encoding failed: {}", e)))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let signature =
        jsonwebtoken::crypto::sign(signing_input.as_bytes(), &key.encoding_key, key.algorithm)
            .map_err(|e| IdpError::Signing(format!("JWT signing operation failed: {}", e)))?;

    Ok(format!("{}.{}", signing_input, signature))
}
