//! The resolution state machine.
//!
//! Starting at a tree root, the resolver probes the current [`Position`]:
//!
//! - a **group** gets its handler (registered, `index.yml`, or default). If
//!   the handler cannot run, its help is printed and resolution stops.
//!   Otherwise the next token is consumed, the handler's `setup` is awaited
//!   and the resolver moves one level down.
//! - a **leaf** gets its action, its argument schema is checked against the
//!   remaining tokens, inputs are bound and the action runs.
//!
//! Probe failures (nothing there, or both a group and a leaf) end the run
//! with an error, as does a token naming an excluded entry. Tokens are never mutated: the resolver walks an immutable
//! slice with a cursor.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error, warn};

use crate::context::Context;
use crate::error::{ResolveError, Result};
use crate::handler::{ChildEntry, DefaultHandler, Group, GroupHandler};
use crate::leaf::{Action, Inputs, Invocation, Leaf};
use crate::manifest::{ManifestAction, ManifestHandler, load_group, load_leaf};
use crate::messages::{DEFAULT_LOCALE, Message};
use crate::position::{LEAF_EXTENSION, Node, Position};
use crate::table::CommandTable;

/// Names hidden from group listings unless configured otherwise.
pub const DEFAULT_EXCLUDES: &str = r"^(index\.yml|options|\..*)$";

static DEFAULT_EXCLUDES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_EXCLUDES).expect("static regex must compile"));

/// How a resolution ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A leaf ran. `action` is its path relative to the root.
    Executed { action: String, inputs: Inputs },
    /// Traversal stopped at a group and its help was printed.
    GroupHelp { group: String },
    /// Too few arguments for a leaf; its usage was printed.
    Usage { action: String },
}

impl Outcome {
    /// False only for [`Outcome::Usage`].
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Usage { .. })
    }
}

pub struct Resolver<'a> {
    root: PathBuf,
    table: &'a CommandTable,
    exclusions: Regex,
    locale: String,
}

impl<'a> Resolver<'a> {
    pub fn new(root: impl Into<PathBuf>, table: &'a CommandTable) -> Self {
        Self {
            root: root.into(),
            table,
            exclusions: DEFAULT_EXCLUDES_RE.clone(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Replaces the pattern of reserved names. Matching entries are hidden
    /// from group listings and never resolve as commands.
    pub fn with_exclusions(mut self, exclusions: Regex) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Locale for help, usage and action output.
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// Resolves `tokens[cursor..]` against the tree and runs the result.
    ///
    /// Help, usage and whatever the action reports are written to `out`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ActionNotFound`] and [`ResolveError::DuplicateAction`]
    /// from probing, [`ResolveError::InvalidArgumentSchema`] for a leaf with
    /// a badly ordered schema, and whatever handlers, manifests or the action
    /// itself fail with.
    pub async fn resolve<W: Write + ?Sized>(
        &self,
        tokens: &[String],
        cursor: usize,
        context: Context,
        out: &mut W,
    ) -> Result<Outcome> {
        debug!(state = "start", root = %self.root.display(), cursor, "resolving");
        let result = self.walk(tokens, cursor, context, out).await;
        if let Err(err) = &result {
            debug!(state = "error", code = %err.code(), %err, "resolution failed");
        }
        result
    }

    async fn walk<W: Write + ?Sized>(
        &self,
        tokens: &[String],
        mut cursor: usize,
        mut context: Context,
        out: &mut W,
    ) -> Result<Outcome> {
        let mut position = Position::root(&self.root);

        loop {
            match position.probe().await? {
                Node::Leaf => {
                    debug!(state = "file", position = %position.relative(), "reached leaf");
                    let remaining = tokens.get(cursor..).unwrap_or_default();
                    return self.run_leaf(&position, remaining, context, out).await;
                }
                Node::Group => {
                    let group = Group {
                        path: position.dir_path(),
                        relative: position.relative(),
                        next: tokens.get(cursor).cloned(),
                    };
                    debug!(state = "directory", position = %group.relative, next = ?group.next, "entered group");

                    let handler = self.handler_for(&position).await?;
                    let allowed = handler.can_run(&group).await;
                    let next = match (allowed, group.next.as_deref()) {
                        (true, Some(next)) => next.to_string(),
                        _ => {
                            let children = self.children(&position).await?;
                            let help = handler.help(&group, &children, &self.locale);
                            writeln!(out, "\n{help}")
                                .map_err(|e| ResolveError::io(&group.path, e))?;
                            return Ok(Outcome::GroupHelp {
                                group: group.relative,
                            });
                        }
                    };

                    if self.is_reserved(&next) {
                        debug!(position = %group.relative, next = %next, "reserved name");
                        return Err(ResolveError::ActionNotFound {
                            path: position.child(&next).dir_path(),
                        });
                    }

                    cursor += 1;
                    context = handler.setup(&group, context).await.map_err(|source| {
                        ResolveError::Handler {
                            group: group.relative.clone(),
                            source,
                        }
                    })?;
                    position = position.child(&next);
                }
            }
        }
    }

    /// Whether `token` names an excluded entry, as a directory or a leaf.
    fn is_reserved(&self, token: &str) -> bool {
        self.exclusions.is_match(token)
            || self
                .exclusions
                .is_match(&format!("{token}.{LEAF_EXTENSION}"))
    }

    /// Registered handler, then `index.yml`, then the default.
    async fn handler_for(&self, position: &Position) -> Result<Arc<dyn GroupHandler>> {
        let relative = position.relative();
        if let Some(handler) = self.table.handler(&relative) {
            debug!(position = %relative, "using registered handler");
            return Ok(handler);
        }
        match load_group(&position.dir_path()).await? {
            Some(manifest) => {
                debug!(position = %relative, "using index handler");
                Ok(Arc::new(ManifestHandler::new(manifest)))
            }
            None => Ok(Arc::new(DefaultHandler)),
        }
    }

    /// Registered action, then the leaf manifest.
    async fn action_for(&self, position: &Position) -> Result<Arc<dyn Action>> {
        if let Some(action) = self.table.action(&position.relative()) {
            return Ok(action);
        }
        let manifest = load_leaf(&position.leaf_path()).await?;
        Ok(Arc::new(ManifestAction::new(manifest)))
    }

    async fn run_leaf<W: Write + ?Sized>(
        &self,
        position: &Position,
        tokens: &[String],
        context: Context,
        out: &mut W,
    ) -> Result<Outcome> {
        let relative = position.relative();
        let name = position
            .name()
            .map(String::from)
            .or_else(|| file_name(position.root_dir()))
            .unwrap_or_default();

        let action = self.action_for(position).await?;
        let leaf = Leaf::new(name.clone(), action.args());

        if let Some(err) = leaf.schema_error() {
            error!(
                code = %Message::OptionalArgsMustBeAtEnd.code(),
                action = %relative,
                %err,
                "{}",
                Message::OptionalArgsMustBeAtEnd.text(&self.locale)
            );
            return Err(ResolveError::InvalidArgumentSchema {
                action: name,
                source: err.clone(),
            });
        }

        if !leaf.can_run(tokens.len()) {
            warn!(
                code = %Message::WrongArguments.code(),
                action = %relative,
                required = leaf.schema().required_count(),
                supplied = tokens.len(),
                "insufficient arguments"
            );
            write!(
                out,
                "{}\n\n{}",
                Message::WrongArguments.log_line(&self.locale, &[]),
                leaf.usage()
            )
            .map_err(|e| ResolveError::io(position.leaf_path(), e))?;
            return Ok(Outcome::Usage { action: relative });
        }

        let (inputs, consumed) = leaf.bind(tokens);
        let invocation = Invocation {
            name: &name,
            inputs: &inputs,
            context: &context,
            rest: &tokens[consumed..],
            locale: &self.locale,
        };
        debug!(action = %relative, ?inputs, "running action");
        let mut buffer = Vec::new();
        let result = action.run(&invocation, &mut buffer).await;
        out.write_all(&buffer)
            .map_err(|e| ResolveError::io(position.leaf_path(), e))?;
        result.map_err(|source| ResolveError::Action {
            action: relative.clone(),
            source,
        })?;

        Ok(Outcome::Executed {
            action: relative,
            inputs,
        })
    }

    /// Entries of a group directory, minus excluded names, with whatever
    /// description can be found for each. Description lookups never fail.
    async fn children(&self, position: &Position) -> Result<Vec<ChildEntry>> {
        let dir = position.dir_path();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| ResolveError::io(&dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ResolveError::io(&dir, e))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if self.exclusions.is_match(&file_name) {
                continue;
            }
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            names.push((file_name, is_dir));
        }
        names.sort();

        let mut children = Vec::with_capacity(names.len());
        for (file_name, is_dir) in names {
            let leaf_name = file_name
                .strip_suffix(&format!(".{LEAF_EXTENSION}"))
                .filter(|_| !is_dir);
            let entry = match leaf_name {
                Some(stem) => ChildEntry {
                    description: self.describe(&position.child(stem), Node::Leaf).await,
                    name: stem.to_string(),
                },
                None if is_dir => ChildEntry {
                    description: self
                        .describe(&position.child(&file_name), Node::Group)
                        .await,
                    name: file_name,
                },
                None => ChildEntry {
                    name: file_name,
                    description: String::new(),
                },
            };
            children.push(entry);
        }
        Ok(children)
    }

    async fn describe(&self, position: &Position, node: Node) -> String {
        let description = match node {
            Node::Leaf => match self.action_for(position).await {
                Ok(action) => action.description().map(String::from),
                Err(err) => {
                    debug!(position = %position.relative(), %err, "no description");
                    None
                }
            },
            Node::Group => match self.handler_for(position).await {
                Ok(handler) => handler.description().map(String::from),
                Err(err) => {
                    debug!(position = %position.relative(), %err, "no description");
                    None
                }
            },
        };
        description.unwrap_or_default()
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let re = Regex::new(DEFAULT_EXCLUDES).unwrap();
        assert!(re.is_match("index.yml"));
        assert!(re.is_match("options"));
        assert!(re.is_match(".git"));
        assert!(!re.is_match("deploy.yml"));
        assert!(!re.is_match("indexer"));
    }

    #[test]
    fn test_only_usage_is_unsuccessful() {
        assert!(
            Outcome::GroupHelp {
                group: String::new()
            }
            .is_success()
        );
        assert!(
            !Outcome::Usage {
                action: "x".into()
            }
            .is_success()
        );
    }
}
