//! Argument classification: splits raw command-line tokens into positional
//! and keyword arguments.
//!
//! A token is a keyword argument when it has the shape `key=value` where:
//! - `key` is identifier-like (starts with a letter or `_`, continues with
//!   letters, digits or `_`)
//! - the first `=` is not immediately followed by a second `=`
//!
//! Everything after the first `=` is the value, so `pip=1.2=1` yields the
//! pair `("pip", "1.2=1")`. Tokens that fail any rule stay positional;
//! classification never rejects input.

use std::collections::BTreeMap;

/// A classified command-line token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentToken {
    Positional(String),
    Keyword { key: String, value: String },
}

impl ArgumentToken {
    /// Classify a single raw token.
    pub fn classify(token: &str) -> Self {
        match parse_kwarg(token) {
            Some((key, value)) => Self::Keyword {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => Self::Positional(token.to_string()),
        }
    }
}

/// Split `token` into `(key, value)` if it is a keyword argument.
pub fn parse_kwarg(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    if !is_identifier(key) || value.starts_with('=') {
        return None;
    }
    Some((key, value))
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Classify every token, preserving order.
pub fn classify<I, S>(tokens: I) -> Vec<ArgumentToken>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| ArgumentToken::classify(t.as_ref()))
        .collect()
}

/// Split raw tokens into positional arguments and a keyword map.
pub fn split_args<I, S>(tokens: I) -> (Vec<String>, BTreeMap<String, String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut positional = Vec::new();
    let mut keyword = BTreeMap::new();
    for token in classify(tokens) {
        match token {
            ArgumentToken::Positional(arg) => positional.push(arg),
            ArgumentToken::Keyword { key, value } => {
                keyword.insert(key, value);
            }
        }
    }
    (positional, keyword)
}

/// Positional and keyword arguments of one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobArgs {
    pub positional: Vec<String>,
    pub keyword: BTreeMap<String, String>,
}

impl JobArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold raw tokens into a job's argument lists. A repeated key keeps
    /// the last value given.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (positional, keyword) = split_args(tokens);
        Self {
            positional,
            keyword,
        }
    }

    /// Look up a keyword argument, falling back to the positional at `index`.
    pub fn get(&self, key: &str, index: usize) -> Option<&str> {
        self.keyword
            .get(key)
            .or_else(|| self.positional.get(index))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Re-render as raw tokens, keywords after positionals.
    pub fn to_tokens(&self) -> Vec<String> {
        self.positional
            .iter()
            .cloned()
            .chain(self.keyword.iter().map(|(k, v)| format!("{k}={v}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_keyword() {
        assert_eq!(parse_kwarg("pip=1.1"), Some(("pip", "1.1")));
    }

    #[test]
    fn double_equals_is_not_keyword() {
        assert_eq!(parse_kwarg("pip==1.1"), None);
        assert_eq!(
            ArgumentToken::classify("pip==1.1"),
            ArgumentToken::Positional("pip==1.1".to_string())
        );
    }

    #[test]
    fn value_keeps_embedded_equals() {
        assert_eq!(parse_kwarg("pip=1.2=1"), Some(("pip", "1.2=1")));
    }

    #[test]
    fn tokens_without_key_stay_positional() {
        for token in ["=", "=value", "arg", "", "==x"] {
            assert_eq!(
                ArgumentToken::classify(token),
                ArgumentToken::Positional(token.to_string()),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn non_identifier_keys_stay_positional() {
        for token in ["a b=1", "1x=2", "-x=1", "key.sub=3", "--flag=on"] {
            assert_eq!(parse_kwarg(token), None, "token {token:?}");
        }
    }

    #[test]
    fn identifier_keys_accepted() {
        assert_eq!(parse_kwarg("_private=1"), Some(("_private", "1")));
        assert_eq!(parse_kwarg("name_2=x"), Some(("name_2", "x")));
        assert_eq!(parse_kwarg("größe=5"), Some(("größe", "5")));
    }

    #[test]
    fn empty_value_is_keyword() {
        assert_eq!(parse_kwarg("key="), Some(("key", "")));
    }

    #[test]
    fn classify_preserves_order() {
        let tokens = classify(["arg", "kwarg=kwarg1", "pip==1.1", "other"]);
        assert_eq!(
            tokens,
            vec![
                ArgumentToken::Positional("arg".to_string()),
                ArgumentToken::Keyword {
                    key: "kwarg".to_string(),
                    value: "kwarg1".to_string()
                },
                ArgumentToken::Positional("pip==1.1".to_string()),
                ArgumentToken::Positional("other".to_string()),
            ]
        );
    }

    #[test]
    fn job_args_last_keyword_wins() {
        let args = JobArgs::from_tokens(["a", "k=1", "b", "k=2"]);
        assert_eq!(args.positional, vec!["a", "b"]);
        assert_eq!(args.keyword.get("k").map(String::as_str), Some("2"));
    }

    #[test]
    fn job_args_get_prefers_keyword() {
        let args = JobArgs::from_tokens(["5", "length=2"]);
        assert_eq!(args.get("length", 0), Some("2"));
        let args = JobArgs::from_tokens(["5"]);
        assert_eq!(args.get("length", 0), Some("5"));
        assert_eq!(args.get("length", 1), None);
    }

    #[test]
    fn to_tokens_round_trips_through_classifier() {
        let args = JobArgs::from_tokens(["x", "b=2", "a=1=1"]);
        assert_eq!(JobArgs::from_tokens(args.to_tokens()), args);
    }

    #[test]
    fn split_args_separates_kinds() {
        let (positional, keyword) = split_args(["a", "k=1", "b", "k=2", "x==y"]);
        assert_eq!(positional, vec!["a", "b", "x==y"]);
        assert_eq!(keyword.get("k").map(String::as_str), Some("2"));
        assert_eq!(keyword.len(), 1);
    }
}
