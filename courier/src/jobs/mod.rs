//! Durable job queue and the drainer that delivers queued mail.
//!
//! # Architecture
//!
//! - [`QueueProvider`]: backend-agnostic storage trait (`put`, `peek_ready`,
//!   `delete`, `bury`). Implement for Beanstalkd, Redis, Postgres, etc.
//! - [`MemoryQueue`]: in-memory provider for development and testing.
//! - [`JobEntry`]: the stored representation of a job. Maps directly to a
//!   database row when using a persistent backend.
//! - [`QueueDrainer`]: takes ready jobs, sends them through a
//!   [`Transport`](crate::mail::Transport), and acknowledges them.
//!
//! # Quick Start
//!
//! ```ignore
//! let queue = Arc::new(MemoryQueue::new());
//! let mailer = Mailer::new(transport.clone(), renderer).with_queue(queue.clone());
//!
//! // 1. Enqueue
//! mailer.queue(Body::html("<p>Hi</p>"), |m| { m.to("user@example.com"); }).await?;
//!
//! // 2. Drain
//! let report = QueueDrainer::new(queue, transport).handle_batch().await;
//! ```

mod drainer;
mod entry;
mod memory;
mod traits;

pub use drainer::{
    DrainFailure, DrainReport, QueueDrainer, DEFAULT_BATCH_LIMIT, DEFAULT_MAX_DECODE_ATTEMPTS,
};
pub use entry::{JobEntry, JobId, JobStatus, ReadyJob};
pub use memory::MemoryQueue;
pub use traits::QueueProvider;
