//! Mock Identity Provider Library
//!
//! A stand-in identity provider for tests of token-consuming services. It
//! generates two RSA signing keys at startup, publishes one of them as a JWKS
//! document and issues RS256 tokens that are either valid for an hour or
//! already expired.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - RSA key generation and JWT signing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Key roles, JWKS and claims
//! - `observability` - Metrics and error categories
//! - `routes` - Router and application state
//! - `services` - Key store, provisioning, JWKS publishing, token issuance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
