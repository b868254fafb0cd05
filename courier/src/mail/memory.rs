use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::message::Message;
use super::transport::{DeliveryResult, Transport};
use crate::error::MailError;

type RejectFn = dyn Fn(&Message) -> bool + Send + Sync;

/// In-memory [`Transport`] for development and testing.
///
/// Every accepted message is kept in order. A rejection predicate can be set
/// to simulate delivery failures for chosen messages.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<Message>>>,
    attempts: Arc<Mutex<usize>>,
    reject: Option<Arc<RejectFn>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send for which `predicate` returns true.
    pub fn rejecting<F>(predicate: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Self {
            reject: Some(Arc::new(predicate)),
            ..Self::default()
        }
    }

    /// Messages accepted so far.
    pub async fn sent(&self) -> Vec<Message> {
        self.sent.lock().await.clone()
    }

    /// Number of send calls, accepted or not.
    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, message: &Message) -> Result<DeliveryResult, MailError> {
        *self.attempts.lock().await += 1;

        if self.reject.as_ref().is_some_and(|reject| reject(message)) {
            return Err(MailError::Transport("recipient rejected".into()));
        }

        let recipients = message.recipients().count();
        self.sent.lock().await.push(message.clone());
        Ok(DeliveryResult {
            transport: "memory",
            recipients,
            response: None,
        })
    }
}
