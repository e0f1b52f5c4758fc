//! Test server harness for E2E testing
//!
//! Provides TestIdpServer for spawning real mock IdP instances in tests.

use crate::crypto_fixtures::{test_signing_key, FixtureKeyGenerator};
use mock_idp_service::config::{Config, StartupMode};
use mock_idp_service::models::{ClaimsTemplate, JsonWebKey, KeyRole};
use mock_idp_service::observability::metrics::init_metrics_recorder;
use mock_idp_service::routes::{self, AppState};
use mock_idp_service::services::key_management_service::{
    self, KeyGenerator, Provisioning, ProvisioningReport,
};
use mock_idp_service::services::key_store::KeyStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the mock identity provider in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_jwks_e2e() -> Result<(), anyhow::Error> {
///     let server = TestIdpServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/.well-known/jwks.json", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestIdpServer {
    addr: SocketAddr,
    key_store: Arc<KeyStore>,
    config: Config,
    provisioning: Option<Provisioning>,
    handle: JoinHandle<()>,
}

impl TestIdpServer {
    /// Spawn a fully provisioned server.
    ///
    /// Fixture keys are registered before the listener binds (gated startup).
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_generator(Arc::new(FixtureKeyGenerator), StartupMode::Gated).await
    }

    /// Spawn a server whose key store is empty and nothing provisions it.
    ///
    /// Use [`TestIdpServer::register_fixture_keys`] to finish startup by hand.
    pub async fn spawn_unprovisioned() -> Result<Self, anyhow::Error> {
        Self::start(Arc::new(KeyStore::new()), Config::default(), None).await
    }

    /// Spawn a server that provisions with `generator` the way `main` does.
    pub async fn spawn_with_generator(
        generator: Arc<dyn KeyGenerator>,
        mode: StartupMode,
    ) -> Result<Self, anyhow::Error> {
        let config = Config {
            startup_mode: mode,
            ..Config::default()
        };
        let key_store = Arc::new(KeyStore::new());

        let provisioning =
            key_management_service::start_provisioning(Arc::clone(&key_store), generator, mode)
                .await;

        Self::start(key_store, config, Some(provisioning)).await
    }

    async fn start(
        key_store: Arc<KeyStore>,
        mut config: Config,
        provisioning: Option<Provisioning>,
    ) -> Result<Self, anyhow::Error> {
        config.bind_address = "127.0.0.1:0".to_string();

        let state = Arc::new(AppState {
            key_store: Arc::clone(&key_store),
            config: config.clone(),
            claims_template: ClaimsTemplate::mock_identity(),
        });

        // Only one recorder can be installed per process; later servers get a
        // standalone one.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            key_store,
            config,
            provisioning,
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the key store backing the server
    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    /// Public key the server holds for a role.
    ///
    /// Panics if the role is not provisioned.
    pub async fn public_key(&self, role: KeyRole) -> JsonWebKey {
        self.key_store
            .public_view(role)
            .await
            .unwrap_or_else(|| panic!("{} key should be provisioned", role))
    }

    /// Register fixture keys for `roles` directly in the key store.
    pub async fn register_fixture_keys(&self, roles: &[KeyRole]) {
        for role in roles {
            self.key_store
                .register(*role, test_signing_key(*role))
                .await;
        }
    }

    /// Wait for the provisioning started at spawn to finish.
    pub async fn wait_for_provisioning(&mut self) -> Result<ProvisioningReport, anyhow::Error> {
        let provisioning = self
            .provisioning
            .take()
            .ok_or_else(|| anyhow::anyhow!("No provisioning in progress"))?;

        provisioning
            .wait()
            .await
            .map_err(|e| anyhow::anyhow!("Provisioning failed: {}", e))
    }
}

impl Drop for TestIdpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
