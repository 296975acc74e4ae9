//! Server boot path: bootstrap → session barrier → queue activation.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::bootstrap::{BootstrapOutcome, SelfHealingBootstrapper};
use crate::domain::TenantId;
use crate::infrastructure::database::DataStore;
use crate::queue::{QueueActivation, QueueActivator};
use crate::sessions::{SessionOrchestrator, SessionsSettled};

/// Fixed-delay ping retry applied before the boot path touches the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreRetry {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for StoreRetry {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Ping the store until it answers or the attempts run out. Returns whether
/// it answered; exhaustion is logged, never fatal.
pub async fn wait_for_store(store: &dyn DataStore, retry: StoreRetry) -> bool {
    let attempts = retry.max_attempts.max(1);
    for attempt in 1..=attempts {
        match store.ping().await {
            Ok(()) => {
                if attempt > 1 {
                    info!(attempt, "✅ Database became reachable");
                }
                return true;
            }
            Err(e) if attempt < attempts => {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "⏳ Database not reachable yet, retrying"
                );
                tokio::time::sleep(retry.delay).await;
            }
            Err(e) => {
                error!(
                    attempts,
                    error = %e,
                    "❌ Database still unreachable; continuing in degraded mode"
                );
            }
        }
    }
    false
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub store_reachable: bool,
    pub bootstrap: BootstrapOutcome,
    pub tenant_lookup_error: Option<String>,
    pub sessions: SessionsSettled,
    pub queue: Option<QueueActivation>,
    pub queue_error: Option<String>,
    pub duration_ms: u64,
}

pub struct StartupSequence {
    store: Arc<dyn DataStore>,
    bootstrapper: SelfHealingBootstrapper,
    orchestrator: SessionOrchestrator,
    activator: QueueActivator,
    store_retry: StoreRetry,
}

impl StartupSequence {
    pub fn new(
        store: Arc<dyn DataStore>,
        bootstrapper: SelfHealingBootstrapper,
        orchestrator: SessionOrchestrator,
        activator: QueueActivator,
    ) -> Self {
        Self {
            store,
            bootstrapper,
            orchestrator,
            activator,
            store_retry: StoreRetry::default(),
        }
    }

    pub fn with_store_retry(mut self, retry: StoreRetry) -> Self {
        self.store_retry = retry;
        self
    }

    /// Run the boot path once. Nothing in here aborts the process: a degraded
    /// store or failing tenants are reported, and the queue is still
    /// activated once the session barrier has been crossed.
    pub async fn run(&self) -> StartupReport {
        let started = Instant::now();

        let store_reachable = wait_for_store(self.store.as_ref(), self.store_retry).await;

        let bootstrap = self.bootstrapper.run().await;

        let (tenants, tenant_lookup_error) = match self.store.list_tenants().await {
            Ok(tenants) => (tenants.into_iter().map(|t| t.id).collect::<Vec<TenantId>>(), None),
            Err(e) => {
                error!(error = %e, "❌ Failed to list companies; no sessions will be started");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let sessions = self.orchestrator.start_all(&tenants).await;

        let (queue, queue_error) = match self.activator.activate(&sessions).await {
            Ok(activation) => (Some(activation), None),
            Err(e) => {
                error!(error = %e, "❌ Failed to start queue processing");
                (None, Some(e.to_string()))
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            duration_ms,
            degraded = bootstrap.is_degraded(),
            tenants = tenants.len(),
            "🏁 Startup sequence complete"
        );

        StartupReport {
            store_reachable,
            bootstrap,
            tenant_lookup_error,
            sessions,
            queue,
            queue_error,
            duration_ms,
        }
    }
}
