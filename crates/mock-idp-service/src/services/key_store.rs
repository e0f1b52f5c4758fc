//! In-memory role → signing key registry.
//!
//! The store is constructed once at startup and shared through `AppState` as an
//! `Arc<KeyStore>`. It never generates keys itself; the provisioner registers
//! them.
//!
//! Keys are held as `Arc<SigningKey>`, so a reader racing a `register` observes
//! either the previous key or the new one, never a partially written key.

use crate::crypto::SigningKey;
use crate::errors::IdpError;
use crate::models::{JsonWebKey, KeyRole};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<KeyRole, Arc<SigningKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key under a role, replacing any previous key for that role.
    pub async fn register(&self, role: KeyRole, key: SigningKey) {
        let mut keys = self.keys.write().await;
        if keys.insert(role, Arc::new(key)).is_some() {
            tracing::info!(target: "idp.keys", role = %role, "Replaced signing key");
        } else {
            tracing::info!(target: "idp.keys", role = %role, "Registered signing key");
        }
    }

    /// Key for a role, or `None` when the role has not been provisioned.
    pub async fn get(&self, role: KeyRole) -> Option<Arc<SigningKey>> {
        self.keys.read().await.get(&role).cloned()
    }

    /// Like [`KeyStore::get`], but a missing key is a `KeyNotFound` error.
    pub async fn require(&self, role: KeyRole) -> Result<Arc<SigningKey>, IdpError> {
        self.get(role).await.ok_or(IdpError::KeyNotFound(role))
    }

    /// Public JWKS projection of the key for a role.
    pub async fn public_view(&self, role: KeyRole) -> Option<JsonWebKey> {
        self.keys
            .read()
            .await
            .get(&role)
            .map(|key| key.public_jwk().clone())
    }

    /// Roles that currently have a key, in [`KeyRole::ALL`] order.
    pub async fn registered_roles(&self) -> Vec<KeyRole> {
        let keys = self.keys.read().await;
        KeyRole::ALL
            .into_iter()
            .filter(|role| keys.contains_key(role))
            .collect()
    }
}
