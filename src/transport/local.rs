//! In-process execution transport.
//!
//! Every job runs detached on its own tokio task. Nothing here waits on a
//! job; dropping every watcher leaves the job running to completion.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::watch;

use crate::error::SubmitError;
use crate::functions::{CallContext, FunctionRegistry};
use crate::job::{JobId, JobRequest, JobStatus};
use crate::transport::{ExecutionTransport, JobTable};

/// Runs jobs on the caller's tokio runtime.
pub struct LocalTransport {
    registry: Arc<FunctionRegistry>,
    jobs: Arc<JobTable>,
}

impl LocalTransport {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            jobs: Arc::new(JobTable::new()),
        }
    }

    /// Get access to the job table.
    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }
}

#[async_trait]
impl ExecutionTransport for LocalTransport {
    async fn submit_job(&self, request: JobRequest) -> Result<JobId, SubmitError> {
        let function =
            self.registry
                .resolve(&request.function)
                .ok_or_else(|| SubmitError::UnknownFunction {
                    name: request.function.clone(),
                })?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SubmitError::TransportUnavailable {
                reason: e.to_string(),
            }
        })?;

        let job_id = JobId::generate();
        let principal = request.auth.as_ref().map(|a| a.principal().to_string());
        self.jobs
            .create(job_id.clone(), request.function.clone(), principal)
            .await;

        let ctx = CallContext {
            job_id: job_id.clone(),
            registry: Arc::clone(&self.registry),
            jobs: Arc::clone(&self.jobs),
        };
        let jobs = Arc::clone(&self.jobs);
        let args = request.args;

        runtime.spawn(async move {
            let result = AssertUnwindSafe(function.call(&args, &ctx))
                .catch_unwind()
                .await;

            let status = match result {
                Ok(Ok(value)) => {
                    tracing::debug!(job_id = %ctx.job_id, function = %function.name(), "Job completed");
                    JobStatus::Completed(value)
                }
                Ok(Err(e)) => {
                    tracing::info!(job_id = %ctx.job_id, error = %e, "Job failed");
                    JobStatus::Failed(e.to_string())
                }
                Err(_) => {
                    tracing::error!(job_id = %ctx.job_id, function = %function.name(), "Job panicked");
                    JobStatus::Failed(format!("{} panicked", function.name()))
                }
            };
            jobs.finish(&ctx.job_id, status).await;
        });

        tracing::debug!(job_id = %job_id, function = %request.function, "Submitted job");
        Ok(job_id)
    }

    async fn subscribe_job(&self, id: &JobId) -> Result<watch::Receiver<JobStatus>, SubmitError> {
        self.jobs
            .subscribe(id)
            .await
            .ok_or_else(|| SubmitError::UnknownJob { id: id.clone() })
    }

    async fn poll_job(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.status(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::args::JobArgs;

    fn transport() -> LocalTransport {
        LocalTransport::new(Arc::new(FunctionRegistry::with_builtins()))
    }

    async fn wait_finished(transport: &LocalTransport, id: &JobId) -> JobStatus {
        let mut rx = transport.subscribe_job(id).await.unwrap();
        loop {
            let status = rx.borrow_and_update().clone();
            if status.is_finished() {
                return status;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn submit_unknown_function() {
        let err = transport()
            .submit_job(JobRequest::new("no.such", JobArgs::new()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::UnknownFunction {
                name: "no.such".to_string()
            }
        );
    }

    #[tokio::test]
    async fn submit_returns_distinct_ids() {
        let transport = transport();
        let a = transport
            .submit_job(JobRequest::new("test.arg", JobArgs::new()))
            .await
            .unwrap();
        let b = transport
            .submit_job(JobRequest::new("test.arg", JobArgs::new()))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn job_result_is_published() {
        let transport = transport();
        let id = transport
            .submit_job(JobRequest::new("test.echo", JobArgs::from_tokens(["hello"])))
            .await
            .unwrap();
        assert_eq!(
            wait_finished(&transport, &id).await,
            JobStatus::Completed(serde_json::json!("hello"))
        );
    }

    #[tokio::test]
    async fn function_error_marks_job_failed() {
        let transport = transport();
        let id = transport
            .submit_job(JobRequest::new("test.echo", JobArgs::new()))
            .await
            .unwrap();
        assert!(matches!(
            wait_finished(&transport, &id).await,
            JobStatus::Failed(reason) if reason.contains("test.echo")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn job_keeps_running_without_watchers() {
        let transport = transport();
        let id = transport
            .submit_job(JobRequest::new("test.sleep", JobArgs::from_tokens(["2"])))
            .await
            .unwrap();

        let rx = transport.subscribe_job(&id).await.unwrap();
        drop(rx);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            transport.poll_job(&id).await,
            Some(JobStatus::Completed(serde_json::json!(true)))
        );
    }

    #[tokio::test]
    async fn subscribe_unknown_job() {
        let err = transport()
            .subscribe_job(&JobId::from("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownJob { .. }));
        assert!(transport().poll_job(&JobId::from("1")).await.is_none());
    }

    #[test]
    fn submit_outside_runtime() {
        let transport = transport();
        let err = futures::executor::block_on(
            transport.submit_job(JobRequest::new("test.arg", JobArgs::new())),
        )
        .unwrap_err();
        assert!(matches!(err, SubmitError::TransportUnavailable { .. }));
    }
}
