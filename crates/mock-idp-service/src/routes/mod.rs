//! HTTP routes for the mock identity provider.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::models::ClaimsTemplate;
use crate::services::key_store::KeyStore;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Signing keys by role, filled in by provisioning.
    pub key_store: Arc<KeyStore>,

    /// Service configuration.
    pub config: Config,

    /// Claims copied into every issued token.
    pub claims_template: ClaimsTemplate,
}

/// Build the application routes.
///
/// - `/.well-known/jwks.json` (GET) - public key of the `current` role
/// - `/auth` (POST) - issue a token, `?expired=<non-empty>` for an expired one
/// - `/health` - liveness probe
/// - `/ready` - readiness probe (both keys provisioned)
/// - `/metrics` - Prometheus metrics
///
/// Any other method on a known path is answered with 405 by the router. HEAD
/// on the JWKS route is refused explicitly, since a `get` method router would
/// otherwise answer it.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route(
            "/.well-known/jwks.json",
            get(handlers::handle_get_jwks).head(handlers::reject_jwks_head),
        )
        .route("/auth", post(handlers::handle_issue_token))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Each .layer() wraps everything added before it:
    // 1. TraceLayer (innermost)
    // 2. TimeoutLayer
    // 3. http_metrics_middleware (outermost, sees 404/405 too)
    public_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
