//! Observability for the mock identity provider
//!
//! Instrumentation uses `#[instrument(skip_all)]` with explicit safe fields
//! (role, status). Private key material and issued tokens never appear in logs
//! or metric labels.

pub mod metrics;

use crate::errors::IdpError;

/// Error categories for metrics labels (bounded cardinality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A role had no signing key (startup race or failed generation)
    KeyUnavailable,
    /// Key generation or signing failed
    Cryptographic,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::KeyUnavailable => "key_unavailable",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&IdpError> for ErrorCategory {
    fn from(err: &IdpError) -> Self {
        match err {
            IdpError::KeyNotFound(_) => ErrorCategory::KeyUnavailable,
            IdpError::KeyGeneration(_) | IdpError::Signing(_) => ErrorCategory::Cryptographic,
            IdpError::ExpiryOutOfRange(_) | IdpError::Internal => ErrorCategory::Internal,
        }
    }
}
