//! Group middleware.
//!
//! Every group the resolver descends through gets a [`GroupHandler`]. The
//! handler decides whether traversal may continue ([`can_run`]), contributes
//! to the shared [`Context`] ([`setup`]) and renders the listing shown when
//! traversal stops at the group ([`help`]).
//!
//! [`can_run`]: GroupHandler::can_run
//! [`setup`]: GroupHandler::setup
//! [`help`]: GroupHandler::help

use std::path::PathBuf;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::HandlerError;
use crate::messages::Message;
use crate::render::{header, tabular};

/// A group the resolver is currently standing on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Directory backing the group.
    pub path: PathBuf,
    /// Path relative to the tree root (`""` at the root).
    pub relative: String,
    /// The next unconsumed token, if any.
    pub next: Option<String>,
}

/// One child listed in a group's help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait GroupHandler: Send + Sync {
    /// Short description shown in the parent's listing.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Whether traversal may descend past this group.
    ///
    /// The default only requires a next token; handlers may be stricter.
    async fn can_run(&self, group: &Group) -> bool {
        group.next.is_some()
    }

    /// Transforms the context handed to the group's children.
    async fn setup(&self, _group: &Group, context: Context) -> Result<Context, HandlerError> {
        Ok(context)
    }

    /// Text printed when traversal stops at this group, in `locale`.
    fn help(&self, _group: &Group, children: &[ChildEntry], locale: &str) -> String {
        default_help(children, locale)
    }
}

/// Handler used when a group registers nothing of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

#[async_trait]
impl GroupHandler for DefaultHandler {}

/// "Available commands" header followed by a name/description table.
pub fn default_help(children: &[ChildEntry], locale: &str) -> String {
    let rows: Vec<Vec<String>> = children
        .iter()
        .map(|child| vec![child.name.clone(), child.description.clone()])
        .collect();

    let mut out = header(Message::AvailableCommands.text(locale));
    out.push_str("\n\n");
    for line in tabular(&rows).lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
