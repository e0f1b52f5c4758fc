//! RSA key fixtures for testing
//!
//! RSA key generation takes long enough that generating fresh keys in every
//! test would dominate the suite. Each role's key is generated once per test
//! binary and shared.

use mock_idp_service::crypto::{SigningKey, MIN_RSA_KEY_BITS};
use mock_idp_service::errors::IdpError;
use mock_idp_service::models::KeyRole;
use mock_idp_service::services::key_management_service::KeyGenerator;
use rsa::RsaPrivateKey;
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, OnceLock};

static CURRENT: OnceLock<RsaPrivateKey> = OnceLock::new();
static EXPIRED: OnceLock<RsaPrivateKey> = OnceLock::new();

/// Shared RSA private key for a role.
pub fn test_rsa_key(role: KeyRole) -> &'static RsaPrivateKey {
    let cell = match role {
        KeyRole::Current => &CURRENT,
        KeyRole::Expired => &EXPIRED,
    };
    cell.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::rngs::OsRng, MIN_RSA_KEY_BITS)
            .expect("fixture key generation should succeed")
    })
}

/// Signing key built from the shared fixture for a role.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(KeyRole::Current);
/// assert_eq!(key.kid(), "current");
/// ```
pub fn test_signing_key(role: KeyRole) -> SigningKey {
    SigningKey::from_rsa_private_key(role, test_rsa_key(role))
        .expect("fixture key should be a valid signing key")
}

/// Key generator that hands out the shared fixture keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureKeyGenerator;

impl KeyGenerator for FixtureKeyGenerator {
    fn generate(&self, role: KeyRole) -> Result<SigningKey, IdpError> {
        Ok(test_signing_key(role))
    }
}

/// Key generator that fails for selected roles and uses fixtures otherwise.
#[derive(Debug, Clone)]
pub struct FailingKeyGenerator {
    failing: HashSet<KeyRole>,
}

impl FailingKeyGenerator {
    pub fn for_roles(roles: &[KeyRole]) -> Self {
        Self {
            failing: roles.iter().copied().collect(),
        }
    }
}

impl KeyGenerator for FailingKeyGenerator {
    fn generate(&self, role: KeyRole) -> Result<SigningKey, IdpError> {
        if self.failing.contains(&role) {
            return Err(IdpError::KeyGeneration(format!(
                "injected failure for {} key",
                role
            )));
        }
        Ok(test_signing_key(role))
    }
}

/// Key generator that blocks until released, then hands out fixtures.
///
/// Holds provisioning open so tests can observe a server that is listening
/// before its keys exist.
#[derive(Debug, Default)]
pub struct HeldKeyGenerator {
    released: Mutex<bool>,
    signal: Condvar,
}

impl HeldKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every pending and future `generate` call proceed.
    pub fn release(&self) {
        // Runs from Drop during unwinding too, so a poisoned lock is recovered
        let mut released = self
            .released
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *released = true;
        self.signal.notify_all();
    }

    /// Guard that releases the generator when dropped.
    ///
    /// Take it before the first fallible step of a test so an early `?` return
    /// or a failed assertion cannot leave blocking-pool threads parked forever.
    pub fn release_on_drop(self: &Arc<Self>) -> ReleaseGuard {
        ReleaseGuard(Arc::clone(self))
    }
}

/// Releases a [`HeldKeyGenerator`] on drop.
#[must_use = "the generator is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReleaseGuard(Arc<HeldKeyGenerator>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl KeyGenerator for HeldKeyGenerator {
    fn generate(&self, role: KeyRole) -> Result<SigningKey, IdpError> {
        let mut released = self
            .released
            .lock()
            .map_err(|_| IdpError::KeyGeneration("release lock poisoned".to_string()))?;
        while !*released {
            released = self
                .signal
                .wait(released)
                .map_err(|_| IdpError::KeyGeneration("release lock poisoned".to_string()))?;
        }
        Ok(test_signing_key(role))
    }
}
