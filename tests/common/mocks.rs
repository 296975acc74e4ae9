use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use tenant_boot::{
    domain::TenantId,
    error::{AppError, Result},
    queue::{InMemoryMessageQueue, MessageQueue, QueuedMessage},
    sessions::SessionTransport,
};

/// Session transport whose behaviour is scripted per tenant. Records when
/// each start attempt finished.
#[derive(Default)]
pub struct ScriptedTransport {
    failing: HashSet<TenantId>,
    hanging: HashSet<TenantId>,
    delay: Duration,
    finished: Mutex<HashMap<TenantId, DateTime<Utc>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, tenant_id: TenantId) -> Self {
        self.failing.insert(tenant_id);
        self
    }

    pub fn hanging(mut self, tenant_id: TenantId) -> Self {
        self.hanging.insert(tenant_id);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn finished_at(&self, tenant_id: TenantId) -> Option<DateTime<Utc>> {
        self.finished.lock().unwrap().get(&tenant_id).copied()
    }

    fn mark_finished(&self, tenant_id: TenantId) {
        self.finished.lock().unwrap().insert(tenant_id, Utc::now());
    }
}

#[async_trait]
impl SessionTransport for ScriptedTransport {
    async fn start_session(&self, tenant_id: TenantId) -> Result<()> {
        if self.hanging.contains(&tenant_id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep(self.delay * tenant_id as u32).await;
        self.mark_finished(tenant_id);

        if self.failing.contains(&tenant_id) {
            return Err(AppError::SessionError(format!(
                "tenant {} handshake refused",
                tenant_id
            )));
        }
        Ok(())
    }
}

/// In-memory queue that remembers when it was activated.
#[derive(Default)]
pub struct RecordingQueue {
    inner: InMemoryMessageQueue,
    activated_at: Mutex<Option<DateTime<Utc>>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        *self.activated_at.lock().unwrap()
    }
}

#[async_trait]
impl MessageQueue for RecordingQueue {
    async fn enqueue(&self, message: QueuedMessage) -> Result<()> {
        self.inner.enqueue(message).await
    }

    async fn consume(&self) -> Result<Option<QueuedMessage>> {
        self.inner.consume().await
    }

    async fn activate(&self) -> Result<()> {
        *self.activated_at.lock().unwrap() = Some(Utc::now());
        self.inner.activate().await
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    async fn pending(&self) -> usize {
        self.inner.pending().await
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture(std::sync::Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber writing into this capture for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
