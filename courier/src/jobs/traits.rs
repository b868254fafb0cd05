use async_trait::async_trait;

use super::entry::{JobId, ReadyJob};
use crate::error::MailError;

/// Backend-agnostic job queue.
///
/// Implement this trait to plug in any persistence layer (Beanstalkd, Redis,
/// SQS, a database table). Jobs are opaque byte payloads.
///
/// `peek_ready` never blocks: it returns `None` as soon as nothing is ready.
/// A job it returns must stay invisible to other consumers for a while
/// (a reservation or visibility timeout) and come back if it is neither
/// deleted nor buried. That is what makes delivery at-least-once.
#[async_trait]
pub trait QueueProvider: Send + Sync + 'static {
    /// Store a new job and return its handle.
    async fn put(&self, payload: Vec<u8>) -> Result<JobId, MailError>;

    /// Hand out the next ready job, if any.
    async fn peek_ready(&self) -> Result<Option<ReadyJob>, MailError>;

    /// Acknowledge a job; it will not be delivered again.
    async fn delete(&self, id: JobId) -> Result<(), MailError>;

    /// Move a job to the dead-letter set.
    async fn bury(&self, id: JobId, reason: &str) -> Result<(), MailError>;
}
