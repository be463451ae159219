//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default upper bound between liveness checks while waiting on a job.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Runner client configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Wait timeout applied when `--timeout` is not given (`None` waits forever).
    pub default_timeout: Option<Duration>,
    /// Interval at which the waiter re-checks job liveness.
    pub poll_interval: Duration,
    /// Users known to the built-in `static` eauth backend.
    pub eauth_users: Vec<StaticUser>,
    /// Per-principal allow-list of function name patterns (`None` allows all).
    pub eauth_acl: Option<Vec<AclEntry>>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            eauth_users: Vec::new(),
            eauth_acl: None,
        }
    }
}

/// A user entry for the `static` backend.
#[derive(Debug, Clone)]
pub struct StaticUser {
    pub username: String,
    /// Plain password, or `sha256:<hex digest>`.
    pub password: SecretString,
}

/// Functions one principal is allowed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Principal name, or `*` for everyone.
    pub principal: String,
    pub patterns: Vec<String>,
}

impl RunnerConfig {
    /// Load configuration from `JOBRUN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_timeout = match lookup("JOBRUN_TIMEOUT_SECS") {
            Some(raw) => Some(parse_seconds("JOBRUN_TIMEOUT_SECS", &raw)?),
            None => None,
        };

        let poll_interval = match lookup("JOBRUN_POLL_INTERVAL_MS") {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JOBRUN_POLL_INTERVAL_MS".to_string(),
                    message: format!("{raw:?} is not a whole number of milliseconds"),
                })?;
                if millis == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "JOBRUN_POLL_INTERVAL_MS".to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let eauth_users = match lookup("JOBRUN_EAUTH_USERS") {
            Some(raw) => parse_users(&raw)?,
            None => Vec::new(),
        };

        let eauth_acl = match lookup("JOBRUN_EAUTH_ACL") {
            Some(raw) => Some(parse_acl(&raw)?),
            None => None,
        };

        Ok(Self {
            default_timeout,
            poll_interval,
            eauth_users,
            eauth_acl,
        })
    }
}

/// Parse a non-negative, finite number of seconds.
pub fn parse_seconds(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} {message}"),
    };
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("is not a number of seconds"))?;
    if secs < 0.0 {
        return Err(invalid("must be a non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid("is out of range"))
}

fn parse_users(raw: &str) -> Result<Vec<StaticUser>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (username, password) =
                entry
                    .split_once(':')
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "JOBRUN_EAUTH_USERS".to_string(),
                        message: "entries must look like user:password".to_string(),
                    })?;
            if username.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "JOBRUN_EAUTH_USERS".to_string(),
                    message: "empty username".to_string(),
                });
            }
            Ok(StaticUser {
                username: username.to_string(),
                password: SecretString::from(password.to_string()),
            })
        })
        .collect()
}

fn parse_acl(raw: &str) -> Result<Vec<AclEntry>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (principal, patterns) =
                entry
                    .split_once('=')
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "JOBRUN_EAUTH_ACL".to_string(),
                        message: "entries must look like user=pattern|pattern".to_string(),
                    })?;
            Ok(AclEntry {
                principal: principal.trim().to_string(),
                patterns: patterns
                    .split('|')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_timeout, None);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(config.eauth_users.is_empty());
        assert!(config.eauth_acl.is_none());
    }

    #[test]
    fn parses_all_keys() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("JOBRUN_TIMEOUT_SECS", "2.5"),
            ("JOBRUN_POLL_INTERVAL_MS", "50"),
            ("JOBRUN_EAUTH_USERS", "saltdev:saltdev, ops:sha256:abcd"),
            ("JOBRUN_EAUTH_ACL", "saltdev=test\\..*|jobs\\..*; *=test.arg"),
        ]))
        .unwrap();

        assert_eq!(config.default_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.eauth_users.len(), 2);
        assert_eq!(config.eauth_users[1].username, "ops");
        assert_eq!(config.eauth_users[1].password.expose_secret(), "sha256:abcd");

        let acl = config.eauth_acl.unwrap();
        assert_eq!(acl[0].principal, "saltdev");
        assert_eq!(acl[0].patterns, vec!["test\\..*", "jobs\\..*"]);
        assert_eq!(acl[1].principal, "*");
    }

    #[test]
    fn rejects_negative_timeout() {
        let err = RunnerConfig::from_lookup(lookup(&[("JOBRUN_TIMEOUT_SECS", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "JOBRUN_TIMEOUT_SECS"));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        assert!(RunnerConfig::from_lookup(lookup(&[("JOBRUN_POLL_INTERVAL_MS", "0")])).is_err());
    }

    #[test]
    fn rejects_malformed_user_entry() {
        assert!(RunnerConfig::from_lookup(lookup(&[("JOBRUN_EAUTH_USERS", "nopassword")])).is_err());
    }

    #[test]
    fn parse_seconds_rejects_non_finite() {
        assert!(parse_seconds("t", "inf").is_err());
        assert!(parse_seconds("t", "NaN").is_err());
        assert_eq!(parse_seconds("t", "0").unwrap(), Duration::ZERO);
    }
}
