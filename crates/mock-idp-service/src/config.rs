use crate::crypto::{MAX_RSA_KEY_BITS, MIN_RSA_KEY_BITS};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub const DEFAULT_KEY_BITS: usize = 2048;

/// Lifetime of tokens issued without `?expired` (1 hour).
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// How far in the past `?expired` tokens expire.
pub const DEFAULT_EXPIRED_TOKEN_OFFSET_SECONDS: i64 = 1000;

/// Upper bound for both token lifetimes (10 years).
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Whether the listener waits for signing keys before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupMode {
    /// Serve immediately while keys are generated in the background. Requests
    /// arriving before generation finishes fail with 500.
    #[default]
    Immediate,
    /// Generate keys first, then bind the listener.
    Gated,
}

impl FromStr for StartupMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(StartupMode::Immediate),
            "gated" => Ok(StartupMode::Gated),
            other => Err(ConfigError::InvalidValue {
                var: "STARTUP_MODE".to_string(),
                reason: format!("expected 'immediate' or 'gated', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for StartupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupMode::Immediate => f.write_str("immediate"),
            StartupMode::Gated => f.write_str("gated"),
        }
    }
}

/// Expiry offsets applied when issuing tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    /// Seconds after issuance a normal token expires.
    pub ttl_seconds: i64,
    /// Seconds before issuance a forced-expired token expired.
    pub expired_offset_seconds: i64,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            expired_offset_seconds: DEFAULT_EXPIRED_TOKEN_OFFSET_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub key_bits: usize,
    pub token_lifetimes: TokenLifetimes,
    pub startup_mode: StartupMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            key_bits: DEFAULT_KEY_BITS,
            token_lifetimes: TokenLifetimes::default(),
            startup_mode: StartupMode::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let key_bits = parse_var(vars, "KEY_BITS", DEFAULT_KEY_BITS)?;
        if !(MIN_RSA_KEY_BITS..=MAX_RSA_KEY_BITS).contains(&key_bits) {
            return Err(ConfigError::InvalidValue {
                var: "KEY_BITS".to_string(),
                reason: format!(
                    "must be between {} and {}, got {}",
                    MIN_RSA_KEY_BITS, MAX_RSA_KEY_BITS, key_bits
                ),
            });
        }

        let ttl_seconds = parse_lifetime(vars, "TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
        let expired_offset_seconds = parse_lifetime(
            vars,
            "EXPIRED_TOKEN_OFFSET_SECONDS",
            DEFAULT_EXPIRED_TOKEN_OFFSET_SECONDS,
        )?;

        let startup_mode = match vars.get("STARTUP_MODE") {
            Some(value) => value.parse()?,
            None => StartupMode::default(),
        };

        Ok(Config {
            bind_address,
            key_bits,
            token_lifetimes: TokenLifetimes {
                ttl_seconds,
                expired_offset_seconds,
            },
            startup_mode,
        })
    }
}

fn parse_var<T>(vars: &HashMap<String, String>, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(var) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_lifetime(
    vars: &HashMap<String, String>,
    var: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let value = parse_var(vars, var, default)?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("must be positive, got {}", value),
        });
    }
    if value > MAX_TOKEN_LIFETIME_SECONDS {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!(
                "must be at most {} seconds, got {}",
                MAX_TOKEN_LIFETIME_SECONDS, value
            ),
        });
    }
    Ok(value)
}
