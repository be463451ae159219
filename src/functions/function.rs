//! The runner function abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::args::JobArgs;
use crate::error::FunctionError;
use crate::functions::registry::FunctionRegistry;
use crate::job::JobId;
use crate::transport::JobTable;

/// What a function can see of the runner while it executes.
#[derive(Clone)]
pub struct CallContext {
    /// Job this call belongs to.
    pub job_id: JobId,
    pub registry: Arc<FunctionRegistry>,
    pub jobs: Arc<JobTable>,
}

/// A named function that can be dispatched as a job.
#[async_trait]
pub trait RunnerFunction: Send + Sync + std::fmt::Debug {
    /// Fully qualified name, e.g. `test.arg`.
    fn name(&self) -> &str;

    /// One-paragraph documentation shown by `--doc`.
    fn summary(&self) -> &str;

    /// Whether the function is kept out of documentation listings.
    fn hidden(&self) -> bool {
        false
    }

    /// Run the function. The returned value is handed back to the caller
    /// unmodified.
    async fn call(
        &self,
        args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError>;
}

/// Fetch a required argument by keyword or position. Supplying it both ways
/// is an error.
pub fn require_arg<'a>(
    function: &str,
    args: &'a JobArgs,
    key: &str,
    index: usize,
) -> Result<&'a str, FunctionError> {
    let invalid = |reason: String| FunctionError::InvalidArguments {
        name: function.to_string(),
        reason,
    };
    if args.keyword.contains_key(key) && args.positional.len() > index {
        return Err(invalid(format!("multiple values for argument '{key}'")));
    }
    args.get(key, index)
        .ok_or_else(|| invalid(format!("missing required argument '{key}'")))
}
