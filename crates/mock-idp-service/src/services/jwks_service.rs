use crate::errors::IdpError;
use crate::models::{Jwks, KeyRole};
use crate::services::key_store::KeyStore;

/// Get JWKS (JSON Web Key Set) for public key distribution
///
/// Only the `current` key is published. Tokens signed by the `expired` key must
/// not be verifiable from the discovery document.
pub async fn publish(store: &KeyStore) -> Result<Jwks, IdpError> {
    let current = store
        .public_view(KeyRole::Current)
        .await
        .ok_or(IdpError::KeyNotFound(KeyRole::Current))?;

    Ok(Jwks {
        keys: vec![current],
    })
}
