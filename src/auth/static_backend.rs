//! `static` eauth backend: users listed in configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::auth::EauthBackend;
use crate::config::StaticUser;

/// Prefix marking a stored password as a hex SHA-256 digest.
const SHA256_PREFIX: &str = "sha256:";

/// Verifies against a fixed user table.
pub struct StaticBackend {
    users: HashMap<String, SecretString>,
}

impl StaticBackend {
    pub fn from_users(users: &[StaticUser]) -> Self {
        Self {
            users: users
                .iter()
                .map(|u| (u.username.clone(), u.password.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl EauthBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.users.get(username) else {
            return false;
        };
        let stored = stored.expose_secret();
        match stored.strip_prefix(SHA256_PREFIX) {
            Some(digest) => {
                let given = format!("{:x}", Sha256::digest(password.as_bytes()));
                constant_time_eq(given.as_bytes(), digest.to_ascii_lowercase().as_bytes())
            }
            None => constant_time_eq(password.as_bytes(), stored.as_bytes()),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> StaticBackend {
        StaticBackend::from_users(&[
            StaticUser {
                username: "saltdev".to_string(),
                password: SecretString::from("saltdev".to_string()),
            },
            StaticUser {
                username: "hashed".to_string(),
                // sha256("secret")
                password: SecretString::from(
                    "sha256:2BB80D537B1DA3E38BD30361AA855686BDE0EACD7162FEF6A25FE97BF527A25B"
                        .to_string(),
                ),
            },
        ])
    }

    #[tokio::test]
    async fn plain_password() {
        let b = backend();
        assert!(b.verify("saltdev", "saltdev").await);
        assert!(!b.verify("saltdev", "wrongpassword").await);
    }

    #[tokio::test]
    async fn hashed_password() {
        let b = backend();
        assert!(b.verify("hashed", "secret").await);
        assert!(!b.verify("hashed", "Secret").await);
    }

    #[tokio::test]
    async fn unknown_user_rejected() {
        assert!(!backend().verify("nobody", "saltdev").await);
    }

    #[test]
    fn constant_time_eq_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
