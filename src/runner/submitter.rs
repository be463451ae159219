//! Job submission.

use std::sync::Arc;

use crate::error::SubmitError;
use crate::functions::FunctionRegistry;
use crate::job::{JobHandle, JobRequest};
use crate::transport::ExecutionTransport;

/// Validates job requests and passes them to the transport.
pub struct JobSubmitter {
    registry: Arc<FunctionRegistry>,
    transport: Arc<dyn ExecutionTransport>,
}

impl JobSubmitter {
    pub fn new(registry: Arc<FunctionRegistry>, transport: Arc<dyn ExecutionTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Submit a job and return its handle without waiting for it.
    ///
    /// `auth_required` is set when the caller asked for external
    /// authentication; the request must then carry a verified context.
    pub async fn submit(
        &self,
        request: JobRequest,
        auth_required: bool,
    ) -> Result<JobHandle, SubmitError> {
        if !self.registry.has(&request.function) {
            return Err(SubmitError::UnknownFunction {
                name: request.function,
            });
        }

        let verified = request.auth.as_ref().is_some_and(|a| a.authenticated());
        if (auth_required || request.auth.is_some()) && !verified {
            return Err(SubmitError::Unauthenticated {
                function: request.function,
            });
        }

        let function = request.function.clone();
        let job_id = self.transport.submit_job(request).await?;
        tracing::info!(job_id = %job_id, function = %function, "Job submitted");
        Ok(JobHandle { job_id, function })
    }
}
