//! The runner client used by the CLI.

use std::sync::Arc;
use std::time::Duration;

use crate::args::JobArgs;
use crate::auth::{AuthDispatcher, AuthorizationContext, Credentials};
use crate::config::RunnerConfig;
use crate::error::{AuthError, ConfigError, Error, SubmitError};
use crate::functions::FunctionRegistry;
use crate::functions::builtin::cmd;
use crate::job::{JobHandle, JobOutcome, JobRequest};
use crate::runner::{JobSubmitter, ResultWaiter};
use crate::transport::{ExecutionTransport, LocalTransport};

/// Dispatches named jobs and waits for their results.
///
/// The registry and the backends are fixed at construction and only read
/// afterwards, so one client can serve concurrent dispatches.
pub struct RunnerClient {
    config: RunnerConfig,
    registry: Arc<FunctionRegistry>,
    auth: AuthDispatcher,
    submitter: JobSubmitter,
    waiter: ResultWaiter,
}

impl RunnerClient {
    pub fn new(
        config: RunnerConfig,
        registry: Arc<FunctionRegistry>,
        auth: AuthDispatcher,
        transport: Arc<dyn ExecutionTransport>,
    ) -> Self {
        let submitter = JobSubmitter::new(Arc::clone(&registry), Arc::clone(&transport));
        let waiter = ResultWaiter::new(transport, config.poll_interval);
        Self {
            config,
            registry,
            auth,
            submitter,
            waiter,
        }
    }

    /// Build a client running the built-in functions in-process.
    pub fn from_config(config: RunnerConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let auth = AuthDispatcher::from_config(&config)?;
        let transport = Arc::new(LocalTransport::new(Arc::clone(&registry)));
        tracing::debug!(
            functions = registry.count(),
            backends = ?auth.available(),
            "Runner client ready"
        );
        Ok(Self::new(config, registry, auth, transport))
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn auth(&self) -> &AuthDispatcher {
        &self.auth
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        function: &str,
    ) -> Result<AuthorizationContext, AuthError> {
        self.auth.authenticate(credentials, Some(function)).await
    }

    pub async fn submit(
        &self,
        request: JobRequest,
        auth_required: bool,
    ) -> Result<JobHandle, SubmitError> {
        self.submitter.submit(request, auth_required).await
    }

    pub async fn wait(&self, handle: &JobHandle, timeout: Option<Duration>) -> JobOutcome {
        self.waiter.wait(handle, timeout).await
    }

    /// The explicit timeout if given, else the configured default.
    pub fn effective_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout.or(self.config.default_timeout)
    }

    /// Authenticate (when credentials are given) and submit. Authentication
    /// always finishes before anything reaches the transport. Functions
    /// reached through `cmd.run` must be allowed for the principal too.
    pub async fn start(
        &self,
        function: &str,
        args: JobArgs,
        credentials: Option<&Credentials>,
        timeout: Option<Duration>,
    ) -> Result<JobHandle, Error> {
        let mut request =
            JobRequest::new(function, args).with_timeout(self.effective_timeout(timeout));
        if let Some(credentials) = credentials {
            let auth = self.authenticate(credentials, function).await?;
            for target in cmd::nested_targets(function, &request.args) {
                self.auth.authorize(auth.principal(), target)?;
            }
            request = request.with_auth(auth);
        }
        Ok(self.submit(request, credentials.is_some()).await?)
    }

    /// Run one job end to end: authenticate, submit, wait.
    pub async fn cmd(
        &self,
        function: &str,
        args: JobArgs,
        credentials: Option<&Credentials>,
        timeout: Option<Duration>,
    ) -> Result<JobOutcome, Error> {
        let handle = self.start(function, args, credentials, timeout).await?;
        Ok(self.wait(&handle, self.effective_timeout(timeout)).await)
    }
}
