//! Runner functions: the named jobs a runner invocation can dispatch.

pub mod builtin;
pub mod function;
pub mod registry;

pub use function::*;
pub use registry::{FunctionDoc, FunctionRegistry};
