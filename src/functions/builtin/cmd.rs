//! `cmd.run`: call another registered function from inside a job.

use async_trait::async_trait;

use crate::args::JobArgs;
use crate::error::FunctionError;
use crate::functions::function::{CallContext, RunnerFunction};

pub const NAME: &str = "cmd.run";

/// Functions that a call to `function` with `args` will end up running
/// through `cmd.run`, outermost first. Empty unless `function` is `cmd.run`.
pub fn nested_targets<'a>(function: &str, args: &'a JobArgs) -> Vec<&'a str> {
    let mut targets = Vec::new();
    if function != NAME {
        return targets;
    }
    for target in args.positional.iter().map(String::as_str) {
        targets.push(target);
        if target != NAME {
            break;
        }
    }
    targets
}

/// Run another function in-process with the remaining arguments.
#[derive(Debug)]
pub struct RunFunction;

#[async_trait]
impl RunnerFunction for RunFunction {
    fn name(&self) -> &str {
        NAME
    }

    fn summary(&self) -> &str {
        "Execute a single function and return its result. The first argument\n\
         names the function; everything after it is passed through.\n\n\
         CLI Example:\n\n    jobrun cmd.run test.sleep 1"
    }

    async fn call(
        &self,
        args: &JobArgs,
        ctx: &CallContext,
    ) -> Result<serde_json::Value, FunctionError> {
        let (target, rest) =
            args.positional
                .split_first()
                .ok_or_else(|| FunctionError::InvalidArguments {
                    name: self.name().to_string(),
                    reason: "missing function name".to_string(),
                })?;

        let function =
            ctx.registry
                .resolve(target)
                .filter(|_| !ctx.registry.is_hidden(target))
                .ok_or_else(|| FunctionError::ExecutionFailed {
                    name: self.name().to_string(),
                    reason: format!("'{target}' is not available."),
                })?;

        let inner = JobArgs {
            positional: rest.to_vec(),
            keyword: args.keyword.clone(),
        };
        tracing::debug!(job_id = %ctx.job_id, target = %target, "Running nested function");
        function.call(&inner, ctx).await
    }
}
