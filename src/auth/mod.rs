//! External authentication ("eauth").
//!
//! Backends are registered by name at startup and verify username/password
//! pairs. The [`AuthDispatcher`] picks the named backend, delegates the
//! credential check to it and then consults the [`AccessList`] for the
//! function about to run. Nothing is cached: every call re-verifies.

pub mod acl;
pub mod backend;
pub mod static_backend;

pub use acl::AccessList;
pub use backend::EauthBackend;
pub use static_backend::StaticBackend;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::config::RunnerConfig;
use crate::error::{AuthError, ConfigError};

/// Name that selects every registered backend in turn.
pub const AUTO_BACKEND: &str = "auto";

/// Credentials for a single dispatch. Never stored past the call.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub backend: String,
}

impl Credentials {
    pub fn new(
        backend: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            backend: backend.into(),
        }
    }
}

/// Proof that a principal was verified by a backend.
///
/// Only the dispatcher can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    authenticated: bool,
    backend: String,
    principal: String,
}

impl AuthorizationContext {
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// The backend that accepted the credentials.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }
}

/// Routes credential checks to the named backend.
pub struct AuthDispatcher {
    /// In registration order; `auto` tries them in this order.
    backends: Vec<Arc<dyn EauthBackend>>,
    acl: AccessList,
}

impl AuthDispatcher {
    pub fn new(acl: AccessList) -> Self {
        Self {
            backends: Vec::new(),
            acl,
        }
    }

    /// Build the dispatcher from configuration: the `static` backend plus
    /// the configured allow-list.
    pub fn from_config(config: &RunnerConfig) -> Result<Self, ConfigError> {
        let acl = AccessList::compile(config.eauth_acl.as_deref())?;
        let mut dispatcher = Self::new(acl);
        dispatcher.register(Arc::new(StaticBackend::from_users(&config.eauth_users)));
        Ok(dispatcher)
    }

    /// Register a backend. Names must be unique and may not shadow `auto`.
    pub fn register(&mut self, backend: Arc<dyn EauthBackend>) -> bool {
        let name = backend.name();
        if name == AUTO_BACKEND || self.backends.iter().any(|b| b.name() == name) {
            tracing::warn!(backend = %name, "Rejected eauth backend registration");
            return false;
        }
        tracing::debug!(backend = %name, "Registered eauth backend");
        self.backends.push(backend);
        true
    }

    /// Backend names accepted by [`authenticate`](Self::authenticate):
    /// `auto` first, then the registered backends sorted.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.iter().map(|b| b.name().to_string()).collect();
        names.sort();
        names.insert(0, AUTO_BACKEND.to_string());
        names
    }

    /// Fail with `UnknownBackend` unless `name` is `auto` or registered.
    pub fn check_backend(&self, name: &str) -> Result<(), AuthError> {
        self.candidates(name).map(|_| ())
    }

    fn candidates(&self, name: &str) -> Result<Vec<&Arc<dyn EauthBackend>>, AuthError> {
        if name == AUTO_BACKEND {
            return Ok(self.backends.iter().collect());
        }
        match self.backends.iter().find(|b| b.name() == name) {
            Some(backend) => Ok(vec![backend]),
            None => {
                tracing::debug!(backend = %name, "Unknown eauth backend");
                Err(AuthError::UnknownBackend {
                    backend: name.to_string(),
                    available: self.available(),
                })
            }
        }
    }

    /// Fail with `NotAuthorized` unless the allow-list lets `principal` run
    /// `function`.
    pub fn authorize(&self, principal: &str, function: &str) -> Result<(), AuthError> {
        if self.acl.permits(principal, function) {
            return Ok(());
        }
        tracing::info!(
            principal = %principal,
            function = %function,
            "Principal not authorized for function"
        );
        Err(AuthError::NotAuthorized {
            principal: principal.to_string(),
            function: function.to_string(),
        })
    }

    /// Verify `credentials` and, when `function` is given, check that the
    /// principal may run it.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        function: Option<&str>,
    ) -> Result<AuthorizationContext, AuthError> {
        let candidates = self.candidates(&credentials.backend)?;

        let mut accepted = None;
        for backend in candidates {
            if backend
                .verify(&credentials.username, credentials.password.expose_secret())
                .await
            {
                accepted = Some(backend.name().to_string());
                break;
            }
        }

        let Some(backend) = accepted else {
            tracing::info!(
                backend = %credentials.backend,
                username = %credentials.username,
                "Authentication failed"
            );
            return Err(AuthError::AuthenticationFailure {
                backend: credentials.backend.clone(),
                username: credentials.username.clone(),
            });
        };

        if let Some(function) = function {
            self.authorize(&credentials.username, function)?;
        }

        tracing::debug!(backend = %backend, principal = %credentials.username, "Authenticated");
        Ok(AuthorizationContext {
            authenticated: true,
            backend,
            principal: credentials.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::AclEntry;

    /// Accepts exactly one password for any user.
    #[derive(Debug)]
    struct FixedBackend {
        name: &'static str,
        password: &'static str,
    }

    #[async_trait]
    impl EauthBackend for FixedBackend {
        fn name(&self) -> &str {
            self.name
        }
        async fn verify(&self, _username: &str, password: &str) -> bool {
            password == self.password
        }
    }

    fn dispatcher(acl: AccessList) -> AuthDispatcher {
        let mut dispatcher = AuthDispatcher::new(acl);
        dispatcher.register(Arc::new(FixedBackend {
            name: "pam",
            password: "saltdev",
        }));
        dispatcher.register(Arc::new(FixedBackend {
            name: "ldap",
            password: "ldappw",
        }));
        dispatcher
    }

    #[tokio::test]
    async fn unknown_backend_lists_auto_and_registered() {
        let err = dispatcher(AccessList::allow_all())
            .authenticate(&Credentials::new("wrongeauth", "saltdev", "saltdev"), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::UnknownBackend {
                backend: "wrongeauth".to_string(),
                available: vec!["auto".into(), "ldap".into(), "pam".into()],
            }
        );
    }

    #[tokio::test]
    async fn unknown_backend_regardless_of_credentials() {
        let d = dispatcher(AccessList::allow_all());
        for (user, pass) in [("saltdev", "saltdev"), ("", ""), ("x", "wrong")] {
            let err = d
                .authenticate(&Credentials::new("nope", user, pass), Some("test.arg"))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::UnknownBackend { .. }));
        }
    }

    #[tokio::test]
    async fn wrong_password_is_authentication_failure() {
        let err = dispatcher(AccessList::allow_all())
            .authenticate(&Credentials::new("pam", "saltdev", "wrongpassword"), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication failure of type \"eauth\" occurred for user saltdev."
        );
    }

    #[tokio::test]
    async fn success_builds_context() {
        let ctx = dispatcher(AccessList::allow_all())
            .authenticate(&Credentials::new("pam", "saltdev", "saltdev"), Some("test.arg"))
            .await
            .unwrap();
        assert!(ctx.authenticated());
        assert_eq!(ctx.backend(), "pam");
        assert_eq!(ctx.principal(), "saltdev");
    }

    #[tokio::test]
    async fn auto_tries_each_backend() {
        let d = dispatcher(AccessList::allow_all());
        let ctx = d
            .authenticate(&Credentials::new("auto", "u", "ldappw"), None)
            .await
            .unwrap();
        assert_eq!(ctx.backend(), "ldap");

        let err = d
            .authenticate(&Credentials::new("auto", "u", "nothing"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailure { ref backend, .. } if backend == "auto"));
    }

    #[tokio::test]
    async fn acl_denies_unlisted_function() {
        let acl = AccessList::compile(Some(&[AclEntry {
            principal: "saltdev".to_string(),
            patterns: vec!["test\\..*".to_string()],
        }]))
        .unwrap();
        let d = dispatcher(acl);
        let creds = Credentials::new("pam", "saltdev", "saltdev");

        assert!(d.authenticate(&creds, Some("test.arg")).await.is_ok());
        let err = d.authenticate(&creds, Some("jobs.active")).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::NotAuthorized {
                principal: "saltdev".to_string(),
                function: "jobs.active".to_string(),
            }
        );
    }

    #[test]
    fn authorize_checks_allow_list_only() {
        let acl = AccessList::compile(Some(&[AclEntry {
            principal: "saltdev".to_string(),
            patterns: vec![r"cmd\.run".to_string()],
        }]))
        .unwrap();
        let d = dispatcher(acl);
        assert!(d.authorize("saltdev", "cmd.run").is_ok());
        assert!(matches!(
            d.authorize("saltdev", "jobs.list_jobs"),
            Err(AuthError::NotAuthorized { .. })
        ));
        assert!(d.authorize("other", "cmd.run").is_err());
    }

    #[tokio::test]
    async fn bad_password_checked_before_acl() {
        let d = dispatcher(AccessList::compile(Some(&[])).unwrap());
        let err = d
            .authenticate(&Credentials::new("pam", "saltdev", "bad"), Some("test.arg"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailure { .. }));
    }

    #[test]
    fn register_rejects_duplicates_and_auto() {
        let mut d = dispatcher(AccessList::allow_all());
        assert!(!d.register(Arc::new(FixedBackend {
            name: "pam",
            password: "x"
        })));
        assert!(!d.register(Arc::new(FixedBackend {
            name: "auto",
            password: "x"
        })));
        assert_eq!(d.available(), vec!["auto", "ldap", "pam"]);
    }

    #[test]
    fn from_config_registers_static() {
        let d = AuthDispatcher::from_config(&RunnerConfig::default()).unwrap();
        assert_eq!(d.available(), vec!["auto", "static"]);
    }

    #[test]
    fn check_backend_accepts_auto_and_registered() {
        let d = dispatcher(AccessList::allow_all());
        assert!(d.check_backend("auto").is_ok());
        assert!(d.check_backend("ldap").is_ok());
        assert!(matches!(
            d.check_backend(""),
            Err(AuthError::UnknownBackend { .. })
        ));
    }
}
