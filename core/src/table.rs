//! Startup registration of Rust-native behaviours.
//!
//! A [`CommandTable`] maps tree positions to handlers and actions, and flag
//! names to option interceptors. The resolver consults it before falling
//! back to manifests on disk and finally to the default behaviours.
//!
//! Keys are positions relative to the tree root, segments joined with `/`.
//! The root group is `""`.
//!
//! ```
//! use std::sync::Arc;
//! use action_runner_core::{CommandTable, DefaultHandler, NoopOption};
//!
//! let table = CommandTable::new()
//!     .with_handler("db", Arc::new(DefaultHandler))
//!     .with_option("dry-run", Arc::new(NoopOption));
//!
//! assert!(table.handler("db").is_some());
//! assert!(table.handler("web").is_none());
//! assert!(table.option("dry-run").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::GroupHandler;
use crate::leaf::Action;
use crate::option::OptionInterceptor;

#[derive(Clone, Default)]
pub struct CommandTable {
    handlers: HashMap<String, Arc<dyn GroupHandler>>,
    actions: HashMap<String, Arc<dyn Action>>,
    options: HashMap<String, Arc<dyn OptionInterceptor>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for the group at `path`.
    pub fn with_handler(mut self, path: &str, handler: Arc<dyn GroupHandler>) -> Self {
        self.handlers.insert(normalize(path), handler);
        self
    }

    /// Registers the action for the leaf at `path`.
    pub fn with_action(mut self, path: &str, action: Arc<dyn Action>) -> Self {
        self.actions.insert(normalize(path), action);
        self
    }

    /// Registers the interceptor for `--name`.
    pub fn with_option(mut self, name: &str, option: Arc<dyn OptionInterceptor>) -> Self {
        self.options.insert(name.to_string(), option);
        self
    }

    pub fn handler(&self, path: &str) -> Option<Arc<dyn GroupHandler>> {
        self.handlers.get(&normalize(path)).cloned()
    }

    pub fn action(&self, path: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(&normalize(path)).cloned()
    }

    pub fn option(&self, name: &str) -> Option<Arc<dyn OptionInterceptor>> {
        self.options.get(name).cloned()
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        let mut actions: Vec<_> = self.actions.keys().collect();
        let mut options: Vec<_> = self.options.keys().collect();
        handlers.sort();
        actions.sort();
        options.sort();
        f.debug_struct("CommandTable")
            .field("handlers", &handlers)
            .field("actions", &actions)
            .field("options", &options)
            .finish()
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
