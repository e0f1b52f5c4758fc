use crate::config::TokenLifetimes;
use crate::crypto;
use crate::errors::IdpError;
use crate::models::{ClaimsTemplate, KeyRole};
use crate::services::key_store::KeyStore;
use chrono::Utc;
use std::fmt;
use tracing::instrument;

/// A freshly signed token and the facts it was issued with.
#[derive(Clone)]
pub struct IssuedToken {
    /// Compact serialization (`header.payload.signature`).
    pub token: String,
    /// Role of the key that signed it.
    pub role: KeyRole,
    /// Expiry written into both the header and the claims.
    pub exp: i64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("role", &self.role)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Expiry for a token issued at `now`.
///
/// Fails instead of wrapping when the offset pushes the expiry outside `i64`.
pub fn compute_exp(
    now: i64,
    force_expired: bool,
    lifetimes: TokenLifetimes,
) -> Result<i64, IdpError> {
    let exp = if force_expired {
        now.checked_sub(lifetimes.expired_offset_seconds)
    } else {
        now.checked_add(lifetimes.ttl_seconds)
    };

    exp.ok_or_else(|| {
        IdpError::ExpiryOutOfRange(format!(
            "now={} force_expired={} lifetimes={:?}",
            now, force_expired, lifetimes
        ))
    })
}

/// Role whose key signs a token with the given expiry.
///
/// Decided by the expiry alone: a token that is already expired at `now` is
/// signed by the `expired` key, anything else by the `current` key.
pub fn select_role(exp: i64, now: i64) -> KeyRole {
    if exp < now {
        KeyRole::Expired
    } else {
        KeyRole::Current
    }
}

/// Issue a signed token from the claims template.
///
/// `force_expired` backdates the expiry so the token is already expired when it
/// is returned.
pub async fn issue_token(
    store: &KeyStore,
    template: &ClaimsTemplate,
    force_expired: bool,
    lifetimes: TokenLifetimes,
) -> Result<IssuedToken, IdpError> {
    issue_token_at(
        store,
        template,
        force_expired,
        lifetimes,
        Utc::now().timestamp(),
    )
    .await
}

/// [`issue_token`] with an explicit issuance time.
#[instrument(skip_all, fields(force_expired = force_expired, role))]
pub async fn issue_token_at(
    store: &KeyStore,
    template: &ClaimsTemplate,
    force_expired: bool,
    lifetimes: TokenLifetimes,
    now: i64,
) -> Result<IssuedToken, IdpError> {
    let exp = compute_exp(now, force_expired, lifetimes)?;
    let claims = template.to_claims(exp);

    let role = select_role(exp, now);
    tracing::Span::current().record("role", role.as_str());

    let key = store.require(role).await.map_err(|e| {
        tracing::warn!(target: "idp.token", role = %role, "Key not found for {} token", role);
        e
    })?;

    // RSA signing is CPU-bound; keep it off the async workers
    let token = tokio::task::spawn_blocking(move || crypto::sign_token(&claims, &key))
        .await
        .map_err(|e| IdpError::Signing(format!("Signing task failed: {}", e)))??;

    tracing::debug!(target: "idp.token", role = %role, exp = exp, "Token issued");

    Ok(IssuedToken { token, role, exp })
}
