//! Runner client: authenticate, submit, then wait.
//!
//! Core components:
//! - `submitter`: validates a request and hands it to the transport
//! - `waiter`: bounded, cancellable wait for a job's single outcome
//! - `client`: orders the steps for one invocation

pub mod client;
pub mod submitter;
pub mod waiter;

pub use client::RunnerClient;
pub use submitter::JobSubmitter;
pub use waiter::ResultWaiter;
