//! Execution transport: where submitted jobs actually run.
//!
//! The runner client only talks to an [`ExecutionTransport`]; it hands over
//! a [`JobRequest`](crate::job::JobRequest), gets back a job id, and watches
//! that id until the job finishes. [`LocalTransport`] runs jobs in-process
//! on the tokio runtime.

pub mod local;
pub mod table;

pub use local::LocalTransport;
pub use table::{JobSummary, JobTable};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::SubmitError;
use crate::job::{JobId, JobRequest, JobStatus};

/// Something that can execute jobs and report on them.
#[async_trait]
pub trait ExecutionTransport: Send + Sync {
    /// Start a job and return its fresh id without waiting for it.
    async fn submit_job(&self, request: JobRequest) -> Result<JobId, SubmitError>;

    /// Watch a job's status. The receiver sees the final status once the
    /// job finishes.
    async fn subscribe_job(&self, id: &JobId) -> Result<watch::Receiver<JobStatus>, SubmitError>;

    /// Current status, or `None` if the transport no longer knows the job.
    async fn poll_job(&self, id: &JobId) -> Option<JobStatus>;
}
