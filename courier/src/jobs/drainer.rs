use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::Instrument;

use super::entry::{JobId, ReadyJob};
use super::traits::QueueProvider;
use crate::error::{ErrorKind, MailError};
use crate::mail::{SendMailJob, Transport};

/// Jobs processed per [`QueueDrainer::handle_queue`] call unless told otherwise.
pub const DEFAULT_BATCH_LIMIT: usize = 50;

/// Deliveries of an undecodable job before it is buried.
pub const DEFAULT_MAX_DECODE_ATTEMPTS: u32 = 3;

/// Summary of one drain cycle.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    /// Jobs taken from the queue.
    pub processed: usize,
    /// Jobs sent and deleted.
    pub succeeded: usize,
    /// Jobs not delivered, including dead-lettered ones.
    pub failed: usize,
    /// Jobs moved to the dead-letter set this cycle.
    pub dead_lettered: usize,
    pub failures: Vec<DrainFailure>,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.failures.is_empty()
    }

    fn fail(&mut self, job: Option<JobId>, error: &MailError) {
        self.failures.push(DrainFailure {
            job,
            kind: error.kind(),
            error: error.to_string(),
        });
    }
}

/// Why a job was not delivered.
#[derive(Debug, Clone)]
pub struct DrainFailure {
    /// `None` when the queue itself failed before handing out a job.
    pub job: Option<JobId>,
    pub kind: ErrorKind,
    pub error: String,
}

enum Outcome {
    Sent,
    Failed(MailError),
    DeadLettered(MailError),
}

/// Delivers queued mail: takes ready jobs, sends them, and deletes them.
///
/// A job whose send fails is left in the queue; its reservation expires and
/// a later cycle retries it. A crash between a successful send and the delete
/// sends the message twice. Several drainers may run against one queue;
/// nothing prevents them from delivering the same job twice either.
///
/// ```ignore
/// let drainer = QueueDrainer::new(queue, transport);
///
/// // one bounded cycle, e.g. from cron
/// let report = drainer.handle_queue(Some(50)).await;
///
/// // or keep draining in the background
/// drainer.poll_interval(Duration::from_secs(5)).start(Some(50));
/// ```
pub struct QueueDrainer {
    queue: Arc<dyn QueueProvider>,
    transport: Arc<dyn Transport>,
    max_decode_attempts: u32,
    poll_interval: Duration,
}

impl QueueDrainer {
    pub fn new(queue: Arc<dyn QueueProvider>, transport: Arc<dyn Transport>) -> Self {
        Self {
            queue,
            transport,
            max_decode_attempts: DEFAULT_MAX_DECODE_ATTEMPTS,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Bury an undecodable job once it has been handed out this many times
    /// (default: 3).
    pub fn max_decode_attempts(mut self, attempts: u32) -> Self {
        self.max_decode_attempts = attempts.max(1);
        self
    }

    /// Pause between cycles of [`start`](Self::start) (default: 1s). Backs off
    /// slightly while the queue stays empty.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// One cycle of at most [`DEFAULT_BATCH_LIMIT`] jobs.
    pub async fn handle_batch(&self) -> DrainReport {
        self.handle_queue(Some(DEFAULT_BATCH_LIMIT)).await
    }

    /// Run one drain cycle of at most `limit` jobs, or until the queue is
    /// empty when `limit` is `None`. [`handle_batch`](Self::handle_batch)
    /// uses [`DEFAULT_BATCH_LIMIT`].
    ///
    /// Per-job failures are recorded in the report and never stop the cycle.
    /// A failing queue ends the cycle early and is recorded the same way. A
    /// job handed out a second time within one cycle is processed, and then
    /// the cycle ends.
    pub async fn handle_queue(&self, limit: Option<usize>) -> DrainReport {
        self.drain(limit)
            .instrument(tracing::info_span!("drain", ?limit))
            .await
    }

    async fn drain(&self, limit: Option<usize>) -> DrainReport {
        let mut report = DrainReport::default();
        let mut seen = HashSet::new();

        while limit.map_or(true, |limit| report.processed < limit) {
            let job = match self.queue.peek_ready().await {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to poll queue");
                    report.fail(None, &e);
                    break;
                }
            };

            // an expired reservation came back around; the handout still
            // counts as an attempt, so process it and end the cycle after
            let repeated = !seen.insert(job.id);

            report.processed += 1;
            let job_id = job.id;
            let span = tracing::info_span!("job", %job_id, attempt = job.attempts);

            match self.process(job).instrument(span).await {
                Outcome::Sent => report.succeeded += 1,
                Outcome::Failed(e) => {
                    report.failed += 1;
                    report.fail(Some(job_id), &e);
                }
                Outcome::DeadLettered(e) => {
                    report.failed += 1;
                    report.dead_lettered += 1;
                    report.fail(Some(job_id), &e);
                }
            }

            if repeated {
                break;
            }
        }

        if !report.is_empty() {
            tracing::info!(
                processed = report.processed,
                succeeded = report.succeeded,
                failed = report.failed,
                "drain cycle finished"
            );
        }
        report
    }

    async fn process(&self, job: ReadyJob) -> Outcome {
        let message = match SendMailJob::decode(job.body()) {
            Ok(payload) => payload.into_message(),
            Err(e) => return self.undecodable(&job, e).await,
        };

        if let Err(e) = self.transport.send(&message).await {
            tracing::warn!(error = %e, "delivery failed, leaving job for retry");
            return Outcome::Failed(e);
        }

        match self.queue.delete(job.id).await {
            Ok(()) => {
                tracing::info!(recipients = message.recipients().count(), "queued mail sent");
                Outcome::Sent
            }
            Err(e) => {
                tracing::warn!(error = %e, "mail sent but job not deleted, it will be sent again");
                Outcome::Failed(e)
            }
        }
    }

    async fn undecodable(&self, job: &ReadyJob, error: MailError) -> Outcome {
        if job.attempts < self.max_decode_attempts {
            tracing::warn!(error = %error, "undecodable job, leaving for retry");
            return Outcome::Failed(error);
        }

        match self.queue.bury(job.id, &error.to_string()).await {
            Ok(()) => {
                tracing::error!(error = %error, "undecodable job buried");
                Outcome::DeadLettered(error)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bury undecodable job");
                Outcome::Failed(e)
            }
        }
    }

    /// Keep draining in a background tokio task. Returns immediately.
    ///
    /// A full batch is followed by another cycle straight away; otherwise the
    /// task sleeps for the poll interval.
    pub fn start(self, limit: Option<usize>) -> JoinHandle<()> {
        tracing::info!("queue drainer running");

        tokio::spawn(async move {
            let mut idle_streak: u32 = 0;

            loop {
                let report = self.handle_queue(limit).await;

                // a zero limit never fills; treat it as idle so the task sleeps
                if limit.is_some_and(|limit| limit > 0 && report.processed >= limit) {
                    idle_streak = 0;
                    continue;
                }

                if report.processed == 0 {
                    idle_streak = idle_streak.saturating_add(1);
                } else {
                    idle_streak = 0;
                }

                let backoff = self
                    .poll_interval
                    .mul_f64((1.5_f64).min(1.0 + idle_streak as f64 * 0.1));
                tokio::time::sleep(backoff).await;
            }
        })
    }
}
