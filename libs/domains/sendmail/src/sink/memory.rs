use super::{DeliveryError, DeliverySink};
use crate::model::Message;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Sink that records messages instead of delivering them.
///
/// Clones share the same inbox.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inbox: Arc<Mutex<Vec<Message>>>,
    failure: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails with `reason`. Nothing is recorded.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            inbox: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    /// Snapshot of the delivered messages, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.inbox.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inbox.lock().await.len()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    async fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        if let Some(reason) = &self.failure {
            return Err(DeliveryError::Other(reason.clone()));
        }
        self.inbox.lock().await.push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
