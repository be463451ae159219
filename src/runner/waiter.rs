//! Result waiting.
//!
//! A wait subscribes to the job's status channel and resolves on the first
//! of: the job finishing, the timeout elapsing, or the transport losing the
//! job. Dropping the wait future releases the subscription and leaves the job
//! itself running.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WaitError;
use crate::job::{JobHandle, JobOutcome, JobStatus};
use crate::transport::ExecutionTransport;

/// Waits for submitted jobs to finish.
pub struct ResultWaiter {
    transport: Arc<dyn ExecutionTransport>,
    /// How long to sleep on the status channel before re-checking that the
    /// transport still tracks the job.
    poll_interval: Duration,
}

impl ResultWaiter {
    pub fn new(transport: Arc<dyn ExecutionTransport>, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
        }
    }

    /// Wait for `handle` to finish, for at most `timeout` if given.
    ///
    /// Produces exactly one outcome. `TimedOut` never means the job was
    /// stopped; it may still finish later.
    pub async fn wait(&self, handle: &JobHandle, timeout: Option<Duration>) -> JobOutcome {
        let finished = self.until_finished(handle);
        let Some(limit) = timeout else {
            return finished.await;
        };
        match tokio::time::timeout(limit, finished).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::info!(job_id = %handle.job_id, timeout = ?limit, "Gave up waiting on job");
                JobOutcome::TimedOut(WaitError::TimedOut {
                    id: handle.job_id.clone(),
                    timeout: limit,
                })
            }
        }
    }

    async fn until_finished(&self, handle: &JobHandle) -> JobOutcome {
        let mut rx = match self.transport.subscribe_job(&handle.job_id).await {
            Ok(rx) => rx,
            Err(e) => return JobOutcome::Failed(e.to_string()),
        };

        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(outcome) = settled(current) {
                return outcome;
            }

            match tokio::time::timeout(self.poll_interval, rx.changed()).await {
                Ok(Ok(())) => {}
                // The transport dropped the job's channel; take whatever it
                // published last.
                Ok(Err(_)) => {
                    let last = rx.borrow().clone();
                    return settled(last).unwrap_or_else(|| lost(handle));
                }
                Err(_) => {
                    if self.transport.poll_job(&handle.job_id).await.is_none() {
                        return lost(handle);
                    }
                    tracing::trace!(job_id = %handle.job_id, "Job still running");
                }
            }
        }
    }
}

fn settled(status: JobStatus) -> Option<JobOutcome> {
    match status {
        JobStatus::Running => None,
        JobStatus::Completed(value) => Some(JobOutcome::Completed(value)),
        JobStatus::Failed(reason) => Some(JobOutcome::Failed(reason)),
    }
}

fn lost(handle: &JobHandle) -> JobOutcome {
    tracing::warn!(job_id = %handle.job_id, "Transport lost track of job");
    JobOutcome::Failed(format!("Job {} is no longer tracked", handle.job_id))
}
