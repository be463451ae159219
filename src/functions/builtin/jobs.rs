//! `jobs.*` functions for inspecting the transport's job table.

use async_trait::async_trait;
use serde_json::json;

use crate::args::JobArgs;
use crate::error::FunctionError;
use crate::functions::function::{CallContext, RunnerFunction, require_arg};
use crate::job::{JobId, JobStatus};

/// Ids of jobs that are still running.
#[derive(Debug)]
pub struct ActiveFunction;

#[async_trait]
impl RunnerFunction for ActiveFunction {
    fn name(&self) -> &str {
        "jobs.active"
    }

    fn summary(&self) -> &str {
        "Return the ids of all jobs that are still running.\n\n\
         CLI Example:\n\n    jobrun jobs.active"
    }

    async fn call(
        &self,
        _args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let ids: Vec<String> = ctx
            .jobs
            .active()
            .await
            .into_iter()
            // The job asking is always running; leave it out.
            .filter(|id| *id != ctx.job_id)
            .map(|id| id.to_string())
            .collect();
        Ok(json!(ids))
    }
}

/// Every job the transport knows about.
#[derive(Debug)]
pub struct ListJobsFunction;

#[async_trait]
impl RunnerFunction for ListJobsFunction {
    fn name(&self) -> &str {
        "jobs.list_jobs"
    }

    fn summary(&self) -> &str {
        "List all known jobs with their function, state and start time.\n\n\
         CLI Example:\n\n    jobrun jobs.list_jobs"
    }

    async fn call(
        &self,
        _args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let mut listing = serde_json::Map::new();
        for summary in ctx.jobs.summaries().await {
            if summary.id == ctx.job_id {
                continue;
            }
            listing.insert(
                summary.id.to_string(),
                json!({
                    "Function": summary.function,
                    "State": summary.state,
                    "User": summary.principal,
                    "StartTime": summary.started_at.to_rfc3339(),
                }),
            );
        }
        Ok(serde_json::Value::Object(listing))
    }
}

/// The return value of a finished job.
#[derive(Debug)]
pub struct LookupJidFunction;

#[async_trait]
impl RunnerFunction for LookupJidFunction {
    fn name(&self) -> &str {
        "jobs.lookup_jid"
    }

    fn summary(&self) -> &str {
        "Return the result of a finished job.\n\n\
         CLI Example:\n\n    jobrun jobs.lookup_jid 20240101120000000001"
    }

    async fn call(
        &self,
        args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let id = JobId::from(require_arg(self.name(), args, "jid", 0)?);
        match ctx.jobs.status(&id).await {
            Some(JobStatus::Completed(value)) => Ok(value),
            Some(JobStatus::Failed(reason)) => Ok(json!({"Error": reason})),
            Some(JobStatus::Running) => Ok(json!({})),
            None => Err(FunctionError::ExecutionFailed {
                name: self.name().to_string(),
                reason: format!("Job {id} not found"),
            }),
        }
    }
}

/// Whether a job finished successfully.
#[derive(Debug)]
pub struct ExitSuccessFunction;

#[async_trait]
impl RunnerFunction for ExitSuccessFunction {
    fn name(&self) -> &str {
        "jobs.exit_success"
    }

    fn summary(&self) -> &str {
        "Return True if the job finished successfully, False otherwise.\n\n\
         CLI Example:\n\n    jobrun jobs.exit_success 20240101120000000001"
    }

    async fn call(
        &self,
        args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let id = JobId::from(require_arg(self.name(), args, "jid", 0)?);
        let success = matches!(ctx.jobs.status(&id).await, Some(JobStatus::Completed(_)));
        Ok(json!(success))
    }
}

/// Drop finished jobs from the table.
#[derive(Debug)]
pub struct PruneFunction;

#[async_trait]
impl RunnerFunction for PruneFunction {
    fn name(&self) -> &str {
        "jobs.prune"
    }

    fn summary(&self) -> &str {
        "Forget every finished job. Internal maintenance entry."
    }

    fn hidden(&self) -> bool {
        true
    }

    async fn call(
        &self,
        _args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let removed = ctx.jobs.prune().await;
        tracing::info!(removed, "Pruned finished jobs");
        Ok(json!(removed))
    }
}
