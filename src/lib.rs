//! jobrun: runner client for named jobs with external authentication.

pub mod args;
pub mod auth;
pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod functions;
pub mod job;
pub mod output;
pub mod runner;
pub mod transport;

pub use error::{Error, Result};
