//! Background message queue and its gated activation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::error::Result;
use crate::sessions::SessionsSettled;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

impl QueuedMessage {
    pub fn new(tenant_id: TenantId, kind: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            kind: kind.to_string(),
            payload,
            queued_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn enqueue(&self, message: QueuedMessage) -> Result<()>;

    /// Next message to process. Always `None` while the queue is inactive:
    /// work enqueued before activation is held, not dropped.
    async fn consume(&self) -> Result<Option<QueuedMessage>>;

    async fn activate(&self) -> Result<()>;

    fn is_active(&self) -> bool;

    async fn pending(&self) -> usize;
}

#[derive(Default)]
pub struct InMemoryMessageQueue {
    messages: Mutex<VecDeque<QueuedMessage>>,
    active: AtomicBool,
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn enqueue(&self, message: QueuedMessage) -> Result<()> {
        self.messages.lock().await.push_back(message);
        Ok(())
    }

    async fn consume(&self) -> Result<Option<QueuedMessage>> {
        if !self.is_active() {
            return Ok(None);
        }
        Ok(self.messages.lock().await.pop_front())
    }

    async fn activate(&self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn pending(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueActivation {
    pub activated_at: DateTime<Utc>,
    pub barrier_settled_at: DateTime<Utc>,
    pub pending_messages: usize,
}

pub struct QueueActivator {
    queue: Arc<dyn MessageQueue>,
}

impl QueueActivator {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Begin background processing. Requires the settled session barrier.
    pub async fn activate(&self, barrier: &SessionsSettled) -> Result<QueueActivation> {
        self.queue.activate().await?;
        let activation = QueueActivation {
            activated_at: Utc::now(),
            barrier_settled_at: barrier.settled_at(),
            pending_messages: self.queue.pending().await,
        };
        info!(
            pending = activation.pending_messages,
            sessions_ok = barrier.succeeded(),
            sessions_failed = barrier.failed().len(),
            "📬 Queue processing started"
        );
        Ok(activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_messages_are_held_until_activation() {
        let queue = InMemoryMessageQueue::new();
        queue
            .enqueue(QueuedMessage::new(1, "send-message", json!({"body": "hi"})))
            .await
            .unwrap();

        assert!(queue.consume().await.unwrap().is_none());
        assert_eq!(queue.pending().await, 1);

        queue.activate().await.unwrap();
        let message = queue.consume().await.unwrap().unwrap();
        assert_eq!(message.tenant_id, 1);
        assert_eq!(queue.pending().await, 0);
    }
}
