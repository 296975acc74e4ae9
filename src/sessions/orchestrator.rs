//! One-shot, all-settle startup barrier over per-tenant session starts.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::transport::SessionTransport;
use crate::domain::TenantId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionOutcome {
    Pending,
    Succeeded,
    Failed(String),
    /// The start attempt exceeded the per-tenant timeout and was abandoned.
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionTask {
    pub tenant_id: TenantId,
    pub outcome: SessionOutcome,
    pub settled_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
}

impl SessionTask {
    fn pending(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            outcome: SessionOutcome::Pending,
            settled_at: None,
            elapsed_ms: 0,
        }
    }
}

/// Proof that a [`SessionOrchestrator::start_all`] pass has fully settled.
///
/// Only the orchestrator can construct this, and the queue activator
/// requires it, so background processing cannot start before the barrier.
#[derive(Debug, Clone, Serialize)]
pub struct SessionsSettled {
    tasks: Vec<SessionTask>,
    settled_at: DateTime<Utc>,
}

impl SessionsSettled {
    pub fn tasks(&self) -> &[SessionTask] {
        &self.tasks
    }

    /// When the barrier was crossed; never earlier than any task's settlement.
    pub fn settled_at(&self) -> DateTime<Utc> {
        self.settled_at
    }

    pub fn latest_task_settlement(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().filter_map(|t| t.settled_at).max()
    }

    pub fn succeeded(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.outcome == SessionOutcome::Succeeded)
            .count()
    }

    pub fn failed(&self) -> Vec<TenantId> {
        self.tasks
            .iter()
            .filter(|t| matches!(t.outcome, SessionOutcome::Failed(_) | SessionOutcome::TimedOut))
            .map(|t| t.tenant_id)
            .collect()
    }

    pub fn outcome_for(&self, tenant_id: TenantId) -> Option<&SessionOutcome> {
        self.tasks
            .iter()
            .find(|t| t.tenant_id == tenant_id)
            .map(|t| &t.outcome)
    }
}

pub struct SessionOrchestrator {
    transport: Arc<dyn SessionTransport>,
    start_timeout: Duration,
}

impl SessionOrchestrator {
    pub fn new(transport: Arc<dyn SessionTransport>, start_timeout: Duration) -> Self {
        Self {
            transport,
            start_timeout,
        }
    }

    /// Start a session for every tenant concurrently and wait until each
    /// attempt has settled.
    ///
    /// A failing, panicking or hung tenant never cancels or delays the
    /// others; a hung tenant holds the barrier for at most `start_timeout`.
    pub async fn start_all(&self, tenants: &[TenantId]) -> SessionsSettled {
        info!(
            tenants = tenants.len(),
            timeout_secs = self.start_timeout.as_secs(),
            "🚀 Starting tenant sessions..."
        );

        let mut tasks: Vec<SessionTask> = tenants.iter().copied().map(SessionTask::pending).collect();

        let handles = tenants.iter().copied().map(|tenant_id| {
            let transport = Arc::clone(&self.transport);
            let limit = self.start_timeout;
            tokio::spawn(async move {
                let started = Instant::now();
                let outcome = match timeout(limit, transport.start_session(tenant_id)).await {
                    Ok(Ok(())) => SessionOutcome::Succeeded,
                    Ok(Err(e)) => SessionOutcome::Failed(e.to_string()),
                    Err(_) => SessionOutcome::TimedOut,
                };
                (outcome, Utc::now(), started.elapsed())
            })
        });

        let results = join_all(handles).await;

        for (task, result) in tasks.iter_mut().zip(results) {
            let (outcome, settled_at, elapsed) = match result {
                Ok(settled) => settled,
                Err(join_error) => (
                    SessionOutcome::Failed(format!("session task aborted: {}", join_error)),
                    Utc::now(),
                    Duration::ZERO,
                ),
            };

            match &outcome {
                SessionOutcome::Succeeded => {}
                SessionOutcome::Failed(reason) => {
                    error!(tenant_id = task.tenant_id, reason = %reason, "❌ Session start failed")
                }
                SessionOutcome::TimedOut => warn!(
                    tenant_id = task.tenant_id,
                    timeout_secs = self.start_timeout.as_secs(),
                    "⏱️ Session start timed out"
                ),
                SessionOutcome::Pending => {}
            }

            task.outcome = outcome;
            task.settled_at = Some(settled_at);
            task.elapsed_ms = elapsed.as_millis() as u64;
        }

        let settled = SessionsSettled {
            tasks,
            settled_at: Utc::now(),
        };

        info!(
            succeeded = settled.succeeded(),
            failed = settled.failed().len(),
            "✅ All tenant session starts settled"
        );
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::sessions::SessionTransport;
    use async_trait::async_trait;

    struct ScriptedTransport;

    #[async_trait]
    impl SessionTransport for ScriptedTransport {
        async fn start_session(&self, tenant_id: TenantId) -> Result<()> {
            match tenant_id {
                2 => Err(AppError::SessionError("handshake refused".to_string())),
                3 => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
                4 => panic!("transport bug"),
                _ => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_tenant_list_settles_immediately() {
        let orchestrator = SessionOrchestrator::new(Arc::new(ScriptedTransport), Duration::from_secs(1));
        let settled = orchestrator.start_all(&[]).await;
        assert!(settled.tasks().is_empty());
        assert!(settled.latest_task_settlement().is_none());
    }

    #[tokio::test]
    async fn test_failures_are_isolated_per_tenant() {
        let orchestrator =
            SessionOrchestrator::new(Arc::new(ScriptedTransport), Duration::from_millis(200));
        let settled = orchestrator.start_all(&[1, 2, 3, 4, 5]).await;

        assert_eq!(settled.tasks().len(), 5);
        assert_eq!(settled.outcome_for(1), Some(&SessionOutcome::Succeeded));
        assert!(matches!(settled.outcome_for(2), Some(SessionOutcome::Failed(_))));
        assert_eq!(settled.outcome_for(3), Some(&SessionOutcome::TimedOut));
        assert!(matches!(settled.outcome_for(4), Some(SessionOutcome::Failed(_))));
        assert_eq!(settled.outcome_for(5), Some(&SessionOutcome::Succeeded));
        assert_eq!(settled.succeeded(), 2);
        assert_eq!(settled.failed(), vec![2, 3, 4]);
        assert!(settled.tasks().iter().all(|t| t.outcome != SessionOutcome::Pending));
    }

    #[tokio::test]
    async fn test_barrier_is_not_before_any_task() {
        let orchestrator =
            SessionOrchestrator::new(Arc::new(ScriptedTransport), Duration::from_millis(100));
        let settled = orchestrator.start_all(&[1, 2, 3]).await;
        let latest = settled.latest_task_settlement().unwrap();
        assert!(settled.settled_at() >= latest);
    }
}
