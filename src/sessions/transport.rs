use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::TenantId;
use crate::error::Result;

#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Start (or resume) the communication session for one tenant.
    async fn start_session(&self, tenant_id: TenantId) -> Result<()>;
}

/// In-process transport used by the server binary: it records which tenants
/// have a live session so the health endpoint can report them.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<TenantId, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    pub async fn started_at(&self, tenant_id: TenantId) -> Option<DateTime<Utc>> {
        self.sessions.read().await.get(&tenant_id).copied()
    }
}

#[async_trait]
impl SessionTransport for SessionRegistry {
    async fn start_session(&self, tenant_id: TenantId) -> Result<()> {
        let now = Utc::now();
        let previous = self.sessions.write().await.insert(tenant_id, now);
        if previous.is_some() {
            info!(tenant_id, "🔁 Session restarted");
        } else {
            info!(tenant_id, "📡 Session started");
        }
        Ok(())
    }
}
