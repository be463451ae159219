//! Job identifiers, requests and outcomes.

use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::args::JobArgs;
use crate::auth::AuthorizationContext;
use crate::error::WaitError;

/// Opaque job identifier.
///
/// Generated ids are numeric timestamps (`YYYYmmddHHMMSSffffff`) that strictly
/// increase within one process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

/// Last id handed out, so two submissions in the same microsecond differ.
static LAST_JOB_ID: LazyLock<Mutex<u128>> = LazyLock::new(|| Mutex::new(0));

impl JobId {
    /// Generate a fresh, process-unique id.
    pub fn generate() -> Self {
        let now: u128 = Utc::now()
            .format("%Y%m%d%H%M%S%6f")
            .to_string()
            .parse()
            .unwrap_or_default();
        let mut last = LAST_JOB_ID.lock().unwrap_or_else(|e| e.into_inner());
        let next = now.max(*last + 1);
        *last = next;
        Self(next.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a job inside the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// What the transport knows about a job right now.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running,
    Completed(serde_json::Value),
    Failed(String),
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        match self {
            Self::Running => JobState::Running,
            Self::Completed(_) => JobState::Completed,
            Self::Failed(_) => JobState::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }
}

/// Everything needed to dispatch one job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub function: String,
    pub args: JobArgs,
    pub auth: Option<AuthorizationContext>,
    pub timeout: Option<Duration>,
}

impl JobRequest {
    pub fn new(function: impl Into<String>, args: JobArgs) -> Self {
        Self {
            function: function.into(),
            args,
            auth: None,
            timeout: None,
        }
    }

    pub fn with_auth(mut self, auth: AuthorizationContext) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A submitted job awaiting its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: JobId,
    pub function: String,
}

/// The single result of waiting on a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The function's return value, untouched.
    Completed(serde_json::Value),
    TimedOut(WaitError),
    Failed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
