//! Space-delimited OAuth 2.0 parameter lists.
//!
//! Response types and scopes are both sets on the wire: order carries no
//! meaning and a value may appear once. [`Arguments`] keeps the original order
//! for display purposes but compares by membership only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered, duplicate-free list of parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Arguments(Vec<String>);

impl Arguments {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses a space-delimited parameter value such as `"token id_token"`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        value.split_whitespace().collect()
    }

    /// Appends a value unless it is already present.
    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() && !self.has(&value) {
            self.0.push(value);
        }
    }

    /// Returns `true` if `value` is a member.
    #[must_use]
    pub fn has(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Returns `true` if every value in `values` is a member.
    #[must_use]
    pub fn has_all<S: AsRef<str>>(&self, values: &[S]) -> bool {
        values.iter().all(|v| self.has(v.as_ref()))
    }

    /// Returns `true` if every member of `other` is also a member of `self`.
    #[must_use]
    pub fn contains_all(&self, other: &Arguments) -> bool {
        other.iter().all(|v| self.has(v))
    }

    /// Returns `true` if the members are exactly `values`, in any order.
    #[must_use]
    pub fn exact<S: AsRef<str>>(&self, values: &[S]) -> bool {
        self.0.len() == values.len() && self.has_all(values)
    }

    /// Returns `true` if the members exactly equal one of `candidates`.
    #[must_use]
    pub fn matches_exact(&self, candidates: &[&[&str]]) -> bool {
        candidates.iter().any(|c| self.exact(*c))
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Arguments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut args = Self::new();
        for value in iter {
            args.push(value);
        }
        args
    }
}

impl From<Vec<String>> for Arguments {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Arguments> for Vec<String> {
    fn from(args: Arguments) -> Self {
        args.0
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_duplicates_and_blanks() {
        let args = Arguments::parse("  openid  profile openid ");
        assert_eq!(args.len(), 2);
        assert_eq!(args.to_string(), "openid profile");
    }

    #[test]
    fn test_exact_is_order_independent() {
        let args = Arguments::parse("id_token token");
        assert!(args.exact(&["token", "id_token"]));
        assert!(!args.exact(&["token"]));
        assert!(!args.exact(&["token", "id_token", "code"]));
    }

    #[test]
    fn test_matches_exact() {
        let candidates: &[&[&str]] = &[&["id_token"], &["token", "id_token"]];
        assert!(Arguments::parse("id_token").matches_exact(candidates));
        assert!(Arguments::parse("id_token token").matches_exact(candidates));
        assert!(!Arguments::parse("token").matches_exact(candidates));
        assert!(!Arguments::parse("code id_token").matches_exact(candidates));
        assert!(!Arguments::new().matches_exact(candidates));
    }

    #[test]
    fn test_contains_all() {
        let allowed = Arguments::parse("token id_token code");
        assert!(allowed.contains_all(&Arguments::parse("id_token token")));
        assert!(!Arguments::parse("token").contains_all(&Arguments::parse("token id_token")));
        assert!(Arguments::new().contains_all(&Arguments::new()));
    }

    #[test]
    fn test_serde_as_list() {
        let args = Arguments::parse("openid offline_access");
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"["openid","offline_access"]"#);

        let back: Arguments = serde_json::from_str(r#"["a","b","a"]"#).unwrap();
        assert_eq!(back, Arguments::parse("a b"));
    }
}
