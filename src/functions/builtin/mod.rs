//! Built-in runner functions: test helpers, job inspection and nested dispatch.

pub mod cmd;
pub mod jobs;

use std::sync::Arc;

use crate::functions::FunctionRegistry;

/// Register every built-in function.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(test::ArgFunction));
    registry.register(Arc::new(test::EchoFunction));
    registry.register(Arc::new(test::SleepFunction));
    registry.register(Arc::new(cmd::RunFunction));
    registry.register(Arc::new(jobs::ActiveFunction));
    registry.register(Arc::new(jobs::ListJobsFunction));
    registry.register(Arc::new(jobs::LookupJidFunction));
    registry.register(Arc::new(jobs::ExitSuccessFunction));
    registry.register_internal(Arc::new(jobs::PruneFunction));
}
