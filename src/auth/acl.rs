//! Allow-list of functions each principal may run.

use regex::Regex;

use crate::config::AclEntry;
use crate::error::ConfigError;

/// Principal name matching everyone.
const ANY_PRINCIPAL: &str = "*";

/// Compiled allow-list. Patterns are anchored to the whole function name.
#[derive(Debug, Clone)]
pub enum AccessList {
    AllowAll,
    Rules(Vec<(String, Vec<Regex>)>),
}

impl AccessList {
    pub fn allow_all() -> Self {
        Self::AllowAll
    }

    /// Compile configured entries; `None` allows every function.
    pub fn compile(entries: Option<&[AclEntry]>) -> Result<Self, ConfigError> {
        let Some(entries) = entries else {
            return Ok(Self::AllowAll);
        };
        let rules = entries
            .iter()
            .map(|entry| {
                let patterns = entry
                    .patterns
                    .iter()
                    .map(|p| {
                        Regex::new(&format!("^(?:{p})$")).map_err(|e| ConfigError::InvalidValue {
                            key: "JOBRUN_EAUTH_ACL".to_string(),
                            message: format!("bad pattern {p:?} for {}: {e}", entry.principal),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((entry.principal.clone(), patterns))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self::Rules(rules))
    }

    /// Whether `principal` may run `function`.
    pub fn permits(&self, principal: &str, function: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Rules(rules) => rules
                .iter()
                .filter(|(who, _)| who == principal || who == ANY_PRINCIPAL)
                .any(|(_, patterns)| patterns.iter().any(|re| re.is_match(function))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(principal: &str, patterns: &[&str]) -> AclEntry {
        AclEntry {
            principal: principal.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn allow_all_permits_anything() {
        assert!(AccessList::allow_all().permits("anyone", "jobs.prune"));
        assert!(AccessList::compile(None).unwrap().permits("x", "y"));
    }

    #[test]
    fn patterns_are_anchored() {
        let acl = AccessList::compile(Some(&[entry("saltdev", &["test\\.arg"])])).unwrap();
        assert!(acl.permits("saltdev", "test.arg"));
        assert!(!acl.permits("saltdev", "test.argument"));
        assert!(!acl.permits("saltdev", "xtest.arg"));
    }

    #[test]
    fn wildcard_principal() {
        let acl = AccessList::compile(Some(&[
            entry("*", &["test\\..*"]),
            entry("admin", &[".*"]),
        ]))
        .unwrap();
        assert!(acl.permits("someone", "test.sleep"));
        assert!(!acl.permits("someone", "jobs.active"));
        assert!(acl.permits("admin", "jobs.active"));
    }

    #[test]
    fn empty_rules_deny() {
        let acl = AccessList::compile(Some(&[])).unwrap();
        assert!(!acl.permits("saltdev", "test.arg"));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = AccessList::compile(Some(&[entry("u", &["("])])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
