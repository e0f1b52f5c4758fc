use crate::errors::IdpError;
use crate::observability::metrics::{record_error, record_token_issuance};
use crate::observability::ErrorCategory;
use crate::routes::AppState;
use crate::services::token_service;
use axum::extract::{Query, State};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Query parameters are kept as raw pairs so repeated and valueless
/// parameters survive extraction.
pub type RawQuery = Vec<(String, String)>;

/// Whether the request asks for an already-expired token.
///
/// `expired` counts when any occurrence carries a non-empty value, so
/// `?expired=0` and `?expired=false` are honored while `?expired` and
/// `?expired=` are not.
pub fn wants_expired(params: &[(String, String)]) -> bool {
    params
        .iter()
        .any(|(name, value)| name == "expired" && !value.is_empty())
}

/// Handle token request
///
/// POST /auth
///
/// Returns the compact JWT as the raw response body. The request body is
/// ignored; the claims always come from the configured template.
#[instrument(name = "idp.token.issue", skip_all, fields(force_expired, role, status))]
pub async fn handle_issue_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RawQuery>,
) -> Result<String, IdpError> {
    let start = Instant::now();
    let force_expired = wants_expired(&params);
    tracing::Span::current().record("force_expired", force_expired);

    let result = token_service::issue_token(
        &state.key_store,
        &state.claims_template,
        force_expired,
        state.config.token_lifetimes,
    )
    .await;

    let duration = start.elapsed();
    match result {
        Ok(issued) => {
            tracing::Span::current().record("role", issued.role.as_str());
            tracing::Span::current().record("status", "success");
            record_token_issuance(issued.role.as_str(), "success", duration);
            Ok(issued.token)
        }
        Err(e) => {
            let role = match &e {
                IdpError::KeyNotFound(role) => role.as_str(),
                _ if force_expired => "expired",
                _ => "current",
            };
            tracing::Span::current().record("status", "error");
            tracing::error!(target: "idp.token", error = %e, role, "Token issuance failed");
            record_token_issuance(role, "error", duration);
            record_error("issue_token", ErrorCategory::from(&e).as_str(), 500);
            Err(e)
        }
    }
}
