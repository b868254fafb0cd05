use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::entry::{JobEntry, JobId, JobStatus, ReadyJob};
use super::traits::QueueProvider;
use crate::error::MailError;

const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(60);

/// In-memory [`QueueProvider`] for development and testing.
///
/// Jobs are stored in a `Vec` behind a mutex and handed out in insertion
/// order. Not durable: all jobs are lost on restart.
#[derive(Clone)]
pub struct MemoryQueue {
    entries: Arc<Mutex<Vec<JobEntry>>>,
    visibility_timeout: Duration,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a handed-out job stays reserved before it is ready again
    /// (default: 60s).
    pub fn visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Jobs that are not buried, whether ready or reserved.
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status != JobStatus::Buried)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every stored job.
    pub async fn entries(&self) -> Vec<JobEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn buried(&self) -> Vec<JobEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status == JobStatus::Buried)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl QueueProvider for MemoryQueue {
    async fn put(&self, payload: Vec<u8>) -> Result<JobId, MailError> {
        let entry = JobEntry::new(payload);
        let id = entry.id;
        self.entries.lock().await.push(entry);
        Ok(id)
    }

    async fn peek_ready(&self) -> Result<Option<ReadyJob>, MailError> {
        let mut entries = self.entries.lock().await;
        let now = OffsetDateTime::now_utc();

        let Some(entry) = entries.iter_mut().find(|e| e.is_ready(now)) else {
            return Ok(None);
        };

        entry.status = JobStatus::Reserved;
        entry.reserved_until = Some(now + self.visibility_timeout);
        entry.attempts += 1;

        Ok(Some(ReadyJob {
            id: entry.id,
            body: entry.payload.clone(),
            attempts: entry.attempts,
        }))
    }

    async fn delete(&self, id: JobId) -> Result<(), MailError> {
        let mut entries = self.entries.lock().await;
        let pos = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| MailError::Queue(format!("job {id} not found")))?;
        entries.remove(pos);
        Ok(())
    }

    async fn bury(&self, id: JobId, reason: &str) -> Result<(), MailError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| MailError::Queue(format!("job {id} not found")))?;
        entry.status = JobStatus::Buried;
        entry.reserved_until = None;
        entry.last_error = Some(reason.to_string());
        Ok(())
    }
}
