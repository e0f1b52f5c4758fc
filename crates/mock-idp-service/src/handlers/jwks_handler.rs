use crate::errors::IdpError;
use crate::models::Jwks;
use crate::observability::metrics::{record_error, record_jwks_request};
use crate::observability::ErrorCategory;
use crate::routes::AppState;
use crate::services::jwks_service;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderName, HeaderValue, ALLOW, CACHE_CONTROL},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle JWKS request
///
/// GET /.well-known/jwks.json
///
/// Returns the `current` public key in JWKS format (RFC 7517). Keys live for
/// the lifetime of the process, so clients may cache for an hour.
#[instrument(name = "idp.jwks.get", skip_all, fields(status))]
pub async fn handle_get_jwks(
    State(state): State<Arc<AppState>>,
) -> Result<(HeaderMap, Json<Jwks>), IdpError> {
    let result = jwks_service::publish(&state.key_store).await;

    let status = if result.is_ok() { "success" } else { "error" };
    tracing::Span::current().record("status", status);
    record_jwks_request(status);

    let jwks = result.map_err(|e| {
        tracing::error!(target: "idp.jwks", error = %e, "Failed to publish JWKS");
        record_error("get_jwks", ErrorCategory::from(&e).as_str(), 500);
        e
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=3600"));

    Ok((headers, Json(jwks)))
}

/// HEAD /.well-known/jwks.json
///
/// The discovery document is GET only.
pub async fn reject_jwks_head() -> (StatusCode, [(HeaderName, &'static str); 1]) {
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET")])
}
