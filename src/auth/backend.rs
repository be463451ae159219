//! The eauth backend capability.

use async_trait::async_trait;

/// A pluggable credential checker, selected by name.
///
/// Implementations must answer the same way for an unknown user and a wrong
/// password.
#[async_trait]
pub trait EauthBackend: Send + Sync {
    /// Name used to select this backend, e.g. `pam`.
    fn name(&self) -> &str;

    /// Check a username/password pair.
    async fn verify(&self, username: &str, password: &str) -> bool;
}
