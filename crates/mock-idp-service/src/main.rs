use mock_idp_service::config::Config;
use mock_idp_service::models::ClaimsTemplate;
use mock_idp_service::observability::metrics::init_metrics_recorder;
use mock_idp_service::routes::{self, AppState};
use mock_idp_service::services::key_management_service::{self, RsaKeyGenerator};
use mock_idp_service::services::key_store::KeyStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_idp_service=debug,idp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mock identity provider");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        key_bits = config.key_bits,
        startup_mode = %config.startup_mode,
        "Configuration loaded successfully"
    );

    // Parse before generating keys so a bad address fails fast
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let key_store = Arc::new(KeyStore::new());

    // Failures are logged inside provisioning; the server keeps running and the
    // affected endpoints answer 500.
    let _provisioning = key_management_service::start_provisioning(
        Arc::clone(&key_store),
        Arc::new(RsaKeyGenerator::new(config.key_bits)),
        config.startup_mode,
    )
    .await;

    let state = Arc::new(AppState {
        key_store,
        config,
        claims_template: ClaimsTemplate::mock_identity(),
    });

    let app = routes::build_routes(state, metrics_handle);

    info!("Mock identity provider listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mock identity provider stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
