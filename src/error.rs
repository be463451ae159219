//! Error types for the runner client.

use std::time::Duration;

use crate::job::JobId;

/// Top-level error type for a single runner invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Argument(#[from] ArgumentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Submit(#[from] SubmitError),

    #[error("{0}")]
    Wait(#[from] WaitError),

    #[error("{0}")]
    Doc(#[from] DocError),

    #[error("{0}")]
    Function(#[from] FunctionError),
}

/// Malformed command-line input that the flag parser let through.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("Invalid timeout {value:?}: expected a non-negative number of seconds")]
    InvalidTimeout { value: String },

    #[error("No function given to run")]
    MissingFunction,

    #[error("External authentication requires --{flag}")]
    MissingCredential { flag: &'static str },
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// External authentication errors.
///
/// `AuthenticationFailure` deliberately carries no hint about which half of
/// the credential pair was wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error(
        "The specified external authentication system \"{backend}\" is not available\nAvailable eauth types: {}",
        .available.join(", ")
    )]
    UnknownBackend {
        backend: String,
        available: Vec<String>,
    },

    #[error("Authentication failure of type \"eauth\" occurred for user {username}.")]
    AuthenticationFailure { backend: String, username: String },

    #[error("User {principal} is not authorized to run {function}.")]
    NotAuthorized { principal: String, function: String },
}

/// Errors raised before a job reaches the execution transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("'{name}' is not available.")]
    UnknownFunction { name: String },

    #[error("Job transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    #[error("Job {id} not found")]
    UnknownJob { id: JobId },

    #[error("Refusing to submit {function} without successful authentication")]
    Unauthenticated { function: String },
}

/// Errors produced while waiting on a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("RunnerClient job '{id}' timed out")]
    TimedOut { id: JobId, timeout: Duration },
}

/// Documentation lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocError {
    #[error("You can only get documentation for one method at one time.")]
    TooManyArguments { given: usize },

    #[error("'{name}' is not available.")]
    UnknownFunction { name: String },
}

/// Failures raised by a runner function while it executes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    #[error("Invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("{name} failed: {reason}")]
    ExecutionFailed { name: String, reason: String },
}

/// Result type alias for the runner client.
pub type Result<T> = std::result::Result<T, Error>;
