//! Leaf commands: argument checking, binding and execution.
//!
//! An [`Action`] is the behaviour behind a leaf. For each resolution the
//! resolver wraps the action's declared arguments in a fresh [`Leaf`], which
//! validates the schema, decides whether enough tokens remain and binds them
//! to argument names.

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::ActionError;
use crate::render::tabular;
use crate::schema::{ArgumentSchema, ArgumentSpec, SchemaError};

/// Bound inputs, argument name to token.
pub type Inputs = BTreeMap<String, String>;

/// Everything an action sees when it runs.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Leaf name (the last consumed token).
    pub name: &'a str,
    pub inputs: &'a Inputs,
    pub context: &'a Context,
    /// Tokens left over after binding.
    pub rest: &'a [String],
    /// Locale for any user-facing text the action produces.
    pub locale: &'a str,
}

#[async_trait]
pub trait Action: Send + Sync {
    /// Short description shown in the parent's listing.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Declared positional arguments, in order.
    fn args(&self) -> Vec<ArgumentSpec> {
        Vec::new()
    }

    /// Runs the leaf. User-facing text goes to `out`, never straight to stdout.
    async fn run(
        &self,
        invocation: &Invocation<'_>,
        out: &mut (dyn Write + Send),
    ) -> Result<(), ActionError>;
}

/// Per-resolution view of a leaf command.
///
/// # Examples
///
/// ```
/// use action_runner_core::{ArgumentSpec, Leaf};
///
/// let leaf = Leaf::new("name", vec![
///     ArgumentSpec::required("a", ""),
///     ArgumentSpec::required("b", ""),
///     ArgumentSpec::optional("c", ""),
/// ]);
/// let tokens = vec!["x".to_string(), "y".to_string()];
/// assert!(leaf.can_run(tokens.len()));
///
/// let (inputs, consumed) = leaf.bind(&tokens);
/// assert_eq!(consumed, 2);
/// assert_eq!(inputs["a"], "x");
/// assert_eq!(inputs["b"], "y");
/// assert!(!inputs.contains_key("c"));
///
/// assert!(!leaf.can_run(1));
/// ```
#[derive(Debug, Clone)]
pub struct Leaf {
    name: String,
    schema: ArgumentSchema,
    schema_error: Option<SchemaError>,
}

impl Leaf {
    /// Validates `specs`. An invalid schema is replaced by the empty schema
    /// and the error is kept for [`schema_error`](Self::schema_error).
    pub fn new(name: impl Into<String>, specs: Vec<ArgumentSpec>) -> Self {
        let (schema, schema_error) = match ArgumentSchema::new(specs) {
            Ok(schema) => (schema, None),
            Err(err) => (ArgumentSchema::empty(), Some(err)),
        };
        Self {
            name: name.into(),
            schema,
            schema_error,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    pub fn schema_error(&self) -> Option<&SchemaError> {
        self.schema_error.as_ref()
    }

    /// True iff the required argument count fits in `remaining` tokens.
    pub fn can_run(&self, remaining: usize) -> bool {
        self.schema.required_count() <= remaining
    }

    /// Walks the schema in order, taking one token per entry. Returns the
    /// bound inputs and the number of tokens consumed.
    pub fn bind(&self, tokens: &[String]) -> (Inputs, usize) {
        let inputs: Inputs = self
            .schema
            .iter()
            .zip(tokens)
            .map(|(spec, token)| (spec.name.clone(), token.clone()))
            .collect();
        let consumed = inputs.len();
        (inputs, consumed)
    }

    /// Signature line followed by a name/description table.
    pub fn usage(&self) -> String {
        let mut out = format!("Usage: {}\n", self.schema.signature(&self.name));

        let rows: Vec<Vec<String>> = self
            .schema
            .iter()
            .filter(|spec| !spec.description.is_empty())
            .map(|spec| vec![spec.name.clone(), spec.description.clone()])
            .collect();
        if !rows.is_empty() {
            out.push('\n');
            for line in tabular(&rows).lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required("a", "First"),
            ArgumentSpec::required("b", "Second"),
            ArgumentSpec::optional("c", "Third"),
        ]
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_can_run_counts_required_only() {
        let leaf = Leaf::new("name", abc());
        assert!(leaf.can_run(2));
        assert!(leaf.can_run(3));
        assert!(leaf.can_run(7));
        assert!(!leaf.can_run(1));
    }

    #[test]
    fn test_bind_fills_optional_when_present() {
        let leaf = Leaf::new("name", abc());
        let (inputs, consumed) = leaf.bind(&tokens(&["x", "y", "z", "extra"]));
        assert_eq!(consumed, 3);
        assert_eq!(inputs.get("c").map(String::as_str), Some("z"));
    }

    #[test]
    fn test_invalid_schema_becomes_empty() {
        let leaf = Leaf::new(
            "name",
            vec![
                ArgumentSpec::optional("a", ""),
                ArgumentSpec::required("b", ""),
            ],
        );
        assert!(matches!(
            leaf.schema_error(),
            Some(SchemaError::OptionalBeforeRequired { .. })
        ));
        assert!(leaf.schema().is_empty());

        let (inputs, consumed) = leaf.bind(&tokens(&["x", "y"]));
        assert!(inputs.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_usage_lists_signature_and_descriptions() {
        let usage = Leaf::new("name", abc()).usage();
        assert!(usage.starts_with("Usage: name a b [c]\n"));
        assert!(usage.contains("  a    First\n"));
        assert!(usage.contains("  c    Third\n"));
    }

    #[test]
    fn test_usage_without_descriptions() {
        let leaf = Leaf::new("ping", vec![ArgumentSpec::required("host", "")]);
        assert_eq!(leaf.usage(), "Usage: ping host\n");
    }
}
