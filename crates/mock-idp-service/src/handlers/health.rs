//! Liveness and readiness probes.
//!
//! - `/health`: the process is running
//! - `/ready`: both signing keys are provisioned

use crate::models::{KeyRole, ReadinessResponse};
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler. Does not check dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 once both the `current` and `expired` keys are registered, 503
/// before that. In `immediate` startup mode this is the signal that `/auth` and
/// the JWKS endpoint will stop answering 500.
#[tracing::instrument(skip_all, name = "idp.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let roles = state.key_store.registered_roles().await;
    let current = roles.contains(&KeyRole::Current);
    let expired = roles.contains(&KeyRole::Expired);

    let status_of = |present: bool| if present { "available" } else { "unavailable" };
    let response = ReadinessResponse {
        status: if current && expired {
            "ready"
        } else {
            "not_ready"
        },
        current_key: status_of(current),
        expired_key: status_of(expired),
    };

    if current && expired {
        (StatusCode::OK, Json(response))
    } else {
        tracing::debug!(current, expired, "Readiness check: signing keys not provisioned");
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
