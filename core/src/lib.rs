//! Resolution engine for command trees mirrored onto a directory.
//!
//! A command line like `deploy web staging --force` is resolved by walking a
//! directory tree one token at a time:
//!
//! - a **group** is a directory. Its [`GroupHandler`] decides whether to
//!   descend, contributes to the shared [`Context`] and renders help when the
//!   walk stops there.
//! - a **leaf** is a `<name>.yml` file. Its [`Action`] declares an
//!   [`ArgumentSchema`]; remaining tokens are bound to it and the action runs.
//!
//! Leading flags are consumed first by [`intercept`], each handled by an
//! [`OptionInterceptor`]. Behaviours are looked up in a [`CommandTable`]
//! registered at startup, then in manifests on disk, then defaulted.
//!
//! # Example
//!
//! ```
//! use action_runner_core::{CommandTable, Context, Outcome, Resolver};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let root = tempfile::tempdir().unwrap();
//! std::fs::create_dir(root.path().join("db")).unwrap();
//! std::fs::write(
//!     root.path().join("db").join("migrate.yml"),
//!     "description: Run migrations\nargs:\n  - name: target\n",
//! )
//! .unwrap();
//!
//! let table = CommandTable::new();
//! let tokens = vec!["db".to_string(), "migrate".to_string(), "v2".to_string()];
//! let mut out = Vec::new();
//! let outcome = Resolver::new(root.path(), &table)
//!     .resolve(&tokens, 0, Context::new(), &mut out)
//!     .await
//!     .unwrap();
//!
//! match outcome {
//!     Outcome::Executed { action, inputs } => {
//!         assert_eq!(action, "db/migrate");
//!         assert_eq!(inputs["target"], "v2");
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! # });
//! ```

mod context;
mod error;
mod handler;
mod leaf;
mod manifest;
mod messages;
mod option;
mod position;
pub mod render;
mod resolver;
mod schema;
mod table;

pub use context::{Context, ContextValue};
pub use error::{ActionError, HandlerError, OptionError, ResolveError, Result};
pub use handler::{ChildEntry, DefaultHandler, Group, GroupHandler, default_help};
pub use leaf::{Action, Inputs, Invocation, Leaf};
pub use manifest::{
    ENV_PREFIX, GROUP_INDEX, GroupManifest, LeafManifest, ManifestAction, ManifestHandler,
    ManifestOption, OPTIONS_DIR, OptionManifest, load_group, load_leaf, load_option, option_path,
    process_env,
};
pub use messages::{DEFAULT_LOCALE, Message};
pub use option::{
    Interception, NoopOption, OptionInterceptor, OptionParam, OptionSource, Params, RootOptions,
    TableOptions, flag_name, intercept,
};
pub use position::{LEAF_EXTENSION, Node, Position, is_valid_segment};
pub use resolver::{DEFAULT_EXCLUDES, Outcome, Resolver};
pub use schema::{ArgumentSchema, ArgumentSpec, SchemaError};
pub use table::CommandTable;
