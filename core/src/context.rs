//! The accumulating context threaded through a resolution.
//!
//! A [`Context`] starts empty, collects the flag names seen by the option
//! pass and grows typed extensions contributed by group handlers and option
//! interceptors. The resolver never inspects it; it only hands the current
//! value to the next handler and finally to the leaf.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed extension value.
///
/// Deserializes untagged so manifests can declare values naturally:
///
/// ```
/// use action_runner_core::ContextValue;
///
/// let value: ContextValue = serde_yaml::from_str("staging").unwrap();
/// assert_eq!(value, ContextValue::String("staging".into()));
///
/// let value: ContextValue = serde_yaml::from_str("[a, b]").unwrap();
/// assert_eq!(value, ContextValue::List(vec!["a".into(), "b".into()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(i64),
    String(String),
    List(Vec<String>),
}

impl ContextValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Flags seen so far plus key/value extensions.
///
/// Extensions follow a last-writer-wins rule per key.
///
/// # Examples
///
/// ```
/// use action_runner_core::Context;
///
/// let mut ctx = Context::new();
/// ctx.push_flag("verbose");
/// ctx.insert("env", "staging");
/// ctx.insert("env", "prod");
///
/// assert!(ctx.has_flag("verbose"));
/// assert_eq!(ctx.get_str("env"), Some("prod"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    flags: Vec<String>,
    extensions: BTreeMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a recognized flag name. Duplicates are kept.
    pub fn push_flag(&mut self, name: impl Into<String>) {
        self.flags.push(name.into());
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    /// Sets an extension, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.extensions.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.extensions.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_str)
    }

    pub fn extensions(&self) -> &BTreeMap<String, ContextValue> {
        &self.extensions
    }

    /// Merges `other` into `self`: flags are appended, extensions from
    /// `other` overwrite matching keys.
    pub fn extend(&mut self, other: Context) {
        self.flags.extend(other.flags);
        self.extensions.extend(other.extensions);
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_writer_wins() {
        let mut ctx = Context::new();
        assert_eq!(ctx.insert("target", "a"), None);
        assert_eq!(
            ctx.insert("target", "b"),
            Some(ContextValue::String("a".into()))
        );
        assert_eq!(ctx.get_str("target"), Some("b"));
    }

    #[test]
    fn test_duplicate_flags_are_kept() {
        let mut ctx = Context::new();
        ctx.push_flag("v");
        ctx.push_flag("v");
        assert_eq!(ctx.flags(), ["v", "v"]);
    }

    #[test]
    fn test_extend_merges_flags_and_overrides_keys() {
        let mut base = Context::new().with("env", "dev").with("region", "eu");
        base.push_flag("dry-run");

        let mut other = Context::new().with("env", "prod");
        other.push_flag("force");

        base.extend(other);
        assert_eq!(base.flags(), ["dry-run", "force"]);
        assert_eq!(base.get_str("env"), Some("prod"));
        assert_eq!(base.get_str("region"), Some("eu"));
    }

    #[test]
    fn test_display_values() {
        assert_eq!(ContextValue::Bool(true).to_string(), "true");
        assert_eq!(ContextValue::Number(3).to_string(), "3");
        assert_eq!(
            ContextValue::List(vec!["a".into(), "b".into()]).to_string(),
            "a,b"
        );
    }

    #[test]
    fn test_new_context_is_empty() {
        assert!(Context::new().is_empty());
        assert!(!Context::new().with("k", 1i64).is_empty());
    }
}
