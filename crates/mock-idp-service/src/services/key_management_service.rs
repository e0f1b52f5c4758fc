use crate::config::StartupMode;
use crate::crypto::{self, SigningKey};
use crate::errors::IdpError;
use crate::models::KeyRole;
use crate::observability::metrics::record_key_generation;
use crate::services::key_store::KeyStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::instrument;

/// Source of signing keys for the provisioner.
///
/// Implementations are CPU-bound and are always invoked on the blocking pool.
pub trait KeyGenerator: Send + Sync + 'static {
    fn generate(&self, role: KeyRole) -> Result<SigningKey, IdpError>;
}

/// Generates fresh RSA keys from the OS CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct RsaKeyGenerator {
    bits: usize,
}

impl RsaKeyGenerator {
    pub fn new(bits: usize) -> Self {
        Self { bits }
    }
}

impl KeyGenerator for RsaKeyGenerator {
    fn generate(&self, role: KeyRole) -> Result<SigningKey, IdpError> {
        crypto::generate_signing_key(role, self.bits)
    }
}

type GenerationTask = JoinHandle<(Result<SigningKey, IdpError>, Duration)>;

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningReport {
    pub provisioned: Vec<KeyRole>,
    pub failed: Vec<KeyRole>,
}

impl ProvisioningReport {
    /// True when every role received a key.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.provisioned.len() == KeyRole::ALL.len()
    }
}

/// Generate one key per role and register each in the store.
///
/// Both keys are generated concurrently on the blocking pool. A failure for one
/// role is logged and leaves that role unpopulated; it never affects the other
/// role and never aborts the caller.
#[instrument(skip_all)]
pub async fn provision(store: &KeyStore, generator: Arc<dyn KeyGenerator>) -> ProvisioningReport {
    // Launch every role before awaiting any of them
    let tasks: Vec<(KeyRole, GenerationTask)> = KeyRole::ALL
        .into_iter()
        .map(|role| {
            let generator = Arc::clone(&generator);
            let task = tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                let result = generator.generate(role);
                (result, start.elapsed())
            });
            (role, task)
        })
        .collect();

    let mut report = ProvisioningReport::default();

    for (role, task) in tasks {
        let (result, duration) = match task.await {
            Ok(outcome) => outcome,
            Err(e) => (
                Err(IdpError::KeyGeneration(format!(
                    "Key generation task failed: {}",
                    e
                ))),
                Duration::ZERO,
            ),
        };

        match result {
            Ok(key) => {
                tracing::info!(
                    target: "idp.keys",
                    role = %role,
                    kid = %key.kid(),
                    bits = key.bits(),
                    duration_ms = duration.as_millis() as u64,
                    "Generated signing key"
                );
                store.register(role, key).await;
                record_key_generation(role.as_str(), "success", duration);
                report.provisioned.push(role);
            }
            Err(e) => {
                tracing::error!(
                    target: "idp.keys",
                    role = %role,
                    error = %e,
                    "Error generating {} key",
                    role
                );
                record_key_generation(role.as_str(), "error", duration);
                report.failed.push(role);
            }
        }
    }

    report
}

/// Provisioning started according to the configured [`StartupMode`].
#[derive(Debug)]
pub enum Provisioning {
    /// Provisioning already ran to completion before returning.
    Completed(ProvisioningReport),
    /// Provisioning is still running in the background.
    Background(JoinHandle<ProvisioningReport>),
}

impl Provisioning {
    /// Wait for provisioning to finish.
    pub async fn wait(self) -> Result<ProvisioningReport, IdpError> {
        match self {
            Provisioning::Completed(report) => Ok(report),
            Provisioning::Background(handle) => handle.await.map_err(|e| {
                tracing::error!(target: "idp.keys", error = %e, "Provisioning task failed");
                IdpError::Internal
            }),
        }
    }
}

/// Start key provisioning for server startup.
///
/// - `StartupMode::Immediate` spawns provisioning and returns at once. The
///   caller may start serving while keys are still being generated; requests in
///   that window see `KeyNotFound`.
/// - `StartupMode::Gated` awaits provisioning before returning, so the listener
///   is only bound once every role has been attempted.
pub async fn start_provisioning(
    store: Arc<KeyStore>,
    generator: Arc<dyn KeyGenerator>,
    mode: StartupMode,
) -> Provisioning {
    match mode {
        StartupMode::Immediate => {
            tracing::info!(target: "idp.keys", "Generating signing keys in the background");
            Provisioning::Background(tokio::spawn(async move {
                let report = provision(&store, generator).await;
                log_report(&report);
                report
            }))
        }
        StartupMode::Gated => {
            tracing::info!(target: "idp.keys", "Generating signing keys before serving");
            let report = provision(&store, generator).await;
            log_report(&report);
            Provisioning::Completed(report)
        }
    }
}

fn log_report(report: &ProvisioningReport) {
    if report.is_complete() {
        tracing::info!(target: "idp.keys", "Signing keys initialized");
    } else {
        tracing::warn!(
            target: "idp.keys",
            failed = ?report.failed,
            "Signing keys partially initialized, affected endpoints will fail"
        );
    }
}
