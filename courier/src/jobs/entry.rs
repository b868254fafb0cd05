use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Opaque handle the queue assigns to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A job handed out by [`QueueProvider::peek_ready`](super::QueueProvider::peek_ready).
#[derive(Debug, Clone)]
pub struct ReadyJob {
    pub id: JobId,
    pub body: Vec<u8>,
    /// Times this job has been handed out, including this one.
    pub attempts: u32,
}

impl ReadyJob {
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// State of a stored job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Ready,
    /// Handed to a consumer; ready again once `reserved_until` passes.
    Reserved,
    /// Dead-lettered. Never handed out again.
    Buried,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Reserved => write!(f, "reserved"),
            Self::Buried => write!(f, "buried"),
        }
    }
}

/// Stored representation of a queued job.
///
/// Fields map directly to columns when a persistent backend stores jobs in
/// a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: JobId,
    pub payload: Vec<u8>,
    pub status: JobStatus,
    pub attempts: u32,
    pub reserved_until: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub created_at: OffsetDateTime,
}

impl JobEntry {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            id: JobId::new(),
            payload,
            status: JobStatus::Ready,
            attempts: 0,
            reserved_until: None,
            last_error: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Whether the job may be handed out at `now`.
    pub fn is_ready(&self, now: OffsetDateTime) -> bool {
        match self.status {
            JobStatus::Ready => true,
            JobStatus::Reserved => self.reserved_until.is_some_and(|until| until <= now),
            JobStatus::Buried => false,
        }
    }
}
