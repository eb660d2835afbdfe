//! Positional argument schemas for leaf commands.
//!
//! A leaf declares an ordered list of [`ArgumentSpec`]s. Once an argument is
//! optional, every argument after it must be optional too; a schema that
//! breaks this ordering is an authoring error and is rejected as a whole.
//!
//! # Examples
//!
//! ```
//! use action_runner_core::{ArgumentSchema, ArgumentSpec, SchemaError};
//!
//! let schema = ArgumentSchema::new(vec![
//!     ArgumentSpec::required("source", "File to copy"),
//!     ArgumentSpec::optional("dest", "Where to put it"),
//! ])
//! .unwrap();
//! assert_eq!(schema.required_count(), 1);
//! assert_eq!(schema.signature("cp"), "cp source [dest]");
//!
//! let err = ArgumentSchema::new(vec![
//!     ArgumentSpec::optional("dest", ""),
//!     ArgumentSpec::required("source", ""),
//! ])
//! .unwrap_err();
//! assert!(matches!(err, SchemaError::OptionalBeforeRequired { .. }));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema authoring errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A required argument follows an optional one.
    #[error("optional argument `{optional}` is followed by required argument `{required}`")]
    OptionalBeforeRequired { optional: String, required: String },
    /// An argument has an empty or whitespace-only name.
    #[error("argument name cannot be empty")]
    EmptyName,
    /// Two arguments share a name.
    #[error("duplicate argument: {0}")]
    DuplicateName(String),
}

/// One positional parameter of a leaf command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub optional: bool,
}

impl ArgumentSpec {
    /// Creates a required argument.
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            optional: false,
        }
    }

    /// Creates an optional argument.
    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            optional: true,
        }
    }
}

/// A validated, ordered sequence of [`ArgumentSpec`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSchema {
    specs: Vec<ArgumentSpec>,
}

impl ArgumentSchema {
    /// Validates `specs` and wraps them.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found. Nothing is reordered or
    /// dropped to make an invalid schema fit.
    pub fn new(specs: Vec<ArgumentSpec>) -> Result<Self, SchemaError> {
        validate_specs(&specs)?;
        Ok(Self { specs })
    }

    /// The empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of non-optional entries.
    pub fn required_count(&self) -> usize {
        self.specs.iter().filter(|spec| !spec.optional).count()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.specs.iter()
    }

    /// Usage signature: required names bare, optional names bracketed.
    pub fn signature(&self, name: &str) -> String {
        let mut out = name.to_string();
        for spec in &self.specs {
            out.push(' ');
            if spec.optional {
                out.push_str(&format!("[{}]", spec.name));
            } else {
                out.push_str(&spec.name);
            }
        }
        out
    }
}

fn validate_specs(specs: &[ArgumentSpec]) -> Result<(), SchemaError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut first_optional: Option<&str> = None;

    for spec in specs {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }

        match (first_optional, spec.optional) {
            (None, true) => first_optional = Some(name),
            (Some(optional), false) => {
                return Err(SchemaError::OptionalBeforeRequired {
                    optional: optional.to_string(),
                    required: name.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}
