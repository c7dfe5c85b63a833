use crate::error::Result;
use crate::queue::{JobContext, StoreQueue};
use crate::task::{JobOutcome, Task};
use phonesift_core::time::now_utc;
use phonesift_core::JobId;
use phonesift_store::repo::QueuedJob;
use phonesift_store::Store;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub queues: Vec<String>,
    pub max_attempts: u32,
    pub retry_after_secs: i64,
    /// Age after which another worker's reservation is reclaimed.
    pub reserve_timeout_secs: i64,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobResult {
    Completed,
    Released { available_at: i64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedJob {
    pub id: JobId,
    pub queue: String,
    pub attempts: i64,
    pub result: JobResult,
}

/// Pulls jobs from the store and applies the retry policy to their results.
pub struct Worker<'a> {
    store: &'a Store,
    options: WorkerOptions,
}

impl<'a> Worker<'a> {
    pub fn new(store: &'a Store, options: WorkerOptions) -> Self {
        Self { store, options }
    }

    /// Runs the first ready job, checking queues in configured order.
    pub fn work_next(&self, now_utc: i64) -> Result<Option<ProcessedJob>> {
        for queue in &self.options.queues {
            let reserved = self
                .store
                .jobs()
                .reserve(now_utc, queue, self.options.reserve_timeout_secs)?;
            if let Some(job) = reserved {
                return self.process(now_utc, job).map(Some);
            }
        }
        Ok(None)
    }

    /// Processes jobs until no queue has anything ready at `clock()`.
    pub fn drain(&self, clock: impl Fn() -> i64) -> Result<Vec<ProcessedJob>> {
        let mut processed = Vec::new();
        while let Some(job) = self.work_next(clock())? {
            processed.push(job);
        }
        Ok(processed)
    }

    /// Polls until `stop` is set, sleeping between empty polls.
    ///
    /// Retryable errors (a busy database, say) are logged and polling goes on;
    /// anything else stops the worker.
    pub fn run(&self, stop: &AtomicBool) -> Result<()> {
        info!(queues = ?self.options.queues, "worker started");
        while !stop.load(Ordering::Relaxed) {
            match self.work_next(now_utc()) {
                Ok(Some(_)) => {}
                Ok(None) => thread::sleep(self.options.poll_interval),
                Err(err) if err.is_retryable() => {
                    warn!(error = %err, "worker poll failed");
                    thread::sleep(self.options.poll_interval);
                }
                Err(err) => return Err(err),
            }
        }
        info!("worker stopped");
        Ok(())
    }

    fn process(&self, now_utc: i64, job: QueuedJob) -> Result<ProcessedJob> {
        // Only a reclaimed job can get here past the limit.
        if job.attempts > i64::from(self.options.max_attempts) {
            let message = format!(
                "abandoned by its worker; retry limit of {} reached",
                self.options.max_attempts
            );
            self.store.jobs().fail(now_utc, job.id, &message)?;
            error!(job_id = %job.id, attempts = job.attempts, "job exhausted retries");
            return Ok(ProcessedJob {
                id: job.id,
                queue: job.queue,
                attempts: job.attempts,
                result: JobResult::Failed { error: message },
            });
        }

        let queue = StoreQueue::new(self.store);
        let ctx = JobContext {
            store: self.store,
            queue: &queue,
            now_utc,
        };

        let outcome = Task::decode(&job.payload).and_then(|task| {
            debug!(job_id = %job.id, task = task.name(), attempt = job.attempts, "running job");
            task.run(&ctx)
        });

        let result = match outcome {
            Ok(JobOutcome::Complete) => {
                self.store.jobs().delete(job.id)?;
                JobResult::Completed
            }
            Ok(JobOutcome::Release) => self.retry_or_fail(now_utc, &job, "released for retry")?,
            Err(err) if err.is_retryable() => {
                warn!(job_id = %job.id, error = %err, "job failed, will retry");
                self.retry_or_fail(now_utc, &job, &err.to_string())?
            }
            Err(err) => {
                let message = err.to_string();
                self.store.jobs().fail(now_utc, job.id, &message)?;
                error!(job_id = %job.id, error = %message, "job failed permanently");
                JobResult::Failed { error: message }
            }
        };

        Ok(ProcessedJob {
            id: job.id,
            queue: job.queue,
            attempts: job.attempts,
            result,
        })
    }

    fn retry_or_fail(&self, now_utc: i64, job: &QueuedJob, reason: &str) -> Result<JobResult> {
        if job.attempts >= i64::from(self.options.max_attempts) {
            let message = format!("{reason}; retry limit of {} reached", self.options.max_attempts);
            self.store.jobs().fail(now_utc, job.id, &message)?;
            error!(job_id = %job.id, attempts = job.attempts, "job exhausted retries");
            return Ok(JobResult::Failed { error: message });
        }

        let available_at = now_utc.saturating_add(self.options.retry_after_secs);
        self.store
            .jobs()
            .release(job.id, available_at, Some(reason))?;
        debug!(job_id = %job.id, available_at, "job released");
        Ok(JobResult::Released { available_at })
    }
}
