//! Job table for tracking jobs the transport is running or has finished.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, watch};

use crate::job::{JobId, JobState, JobStatus};

/// One tracked job.
#[derive(Debug)]
struct JobRecord {
    function: String,
    principal: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: watch::Sender<JobStatus>,
}

/// Listing entry for a tracked job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub function: String,
    pub state: JobState,
    pub principal: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Tracks jobs by id. Each job publishes its status on a `watch` channel so
/// waiters are woken exactly when it finishes.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a running job.
    pub async fn create(&self, id: JobId, function: impl Into<String>, principal: Option<String>) {
        let (status, _) = watch::channel(JobStatus::Running);
        let record = JobRecord {
            function: function.into(),
            principal,
            started_at: Utc::now(),
            finished_at: None,
            status,
        };
        self.jobs.write().await.insert(id, record);
    }

    /// Record a job's final status and wake its waiters. Returns `false` if
    /// the job is unknown or already finished.
    pub async fn finish(&self, id: &JobId, status: JobStatus) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(record) = jobs.get_mut(id) else {
            tracing::warn!(job_id = %id, "Finished job is no longer tracked");
            return false;
        };
        if record.status.borrow().is_finished() {
            tracing::warn!(job_id = %id, "Ignoring second completion for job");
            return false;
        }
        record.finished_at = Some(Utc::now());
        record.status.send_replace(status);
        true
    }

    /// Subscribe to status changes of a job.
    pub async fn subscribe(&self, id: &JobId) -> Option<watch::Receiver<JobStatus>> {
        self.jobs.read().await.get(id).map(|r| r.status.subscribe())
    }

    /// Current status of a job.
    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|r| r.status.borrow().clone())
    }

    /// Number of live subscriptions on a job.
    pub async fn watcher_count(&self, id: &JobId) -> usize {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|r| r.status.receiver_count())
            .unwrap_or(0)
    }

    /// Summaries of every tracked job, oldest first.
    pub async fn summaries(&self) -> Vec<JobSummary> {
        let mut summaries: Vec<JobSummary> = self
            .jobs
            .read()
            .await
            .iter()
            .map(|(id, r)| JobSummary {
                id: id.clone(),
                function: r.function.clone(),
                state: r.status.borrow().state(),
                principal: r.principal.clone(),
                started_at: r.started_at,
                finished_at: r.finished_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Ids of jobs still running, oldest first.
    pub async fn active(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self
            .jobs
            .read()
            .await
            .iter()
            .filter(|(_, r)| !r.status.borrow().is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop finished jobs. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, r| !r.status.borrow().is_finished());
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}
