//! Error types for command resolution.
//!
//! [`ResolveError`] is what aborts a resolution. Each variant carries a
//! stable code from the [`Message`] table so callers can report failures
//! without matching on display strings. Usage errors (too few arguments) and
//! unknown options are handled inside the engine and never show up here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::messages::Message;
use crate::schema::SchemaError;

/// Failure raised by a [`GroupHandler`](crate::GroupHandler).
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure raised by an [`OptionInterceptor`](crate::OptionInterceptor).
#[derive(Debug, Error)]
pub enum OptionError {
    #[error("{0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure raised while running an [`Action`](crate::Action).
#[derive(Debug, Error)]
pub enum ActionError {
    /// The spawned process exited unsuccessfully.
    #[error("process exited with status {status}")]
    Failed { status: i32 },
    /// The process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// Writing the action's output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// Errors that abort a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither a group directory nor a leaf file exists at the position.
    #[error("action does not exist: {}", path.display())]
    ActionNotFound { path: PathBuf },

    /// Both a group directory and a leaf file exist at the position.
    #[error("a group and an action share the path: {}", path.display())]
    DuplicateAction { path: PathBuf },

    /// A leaf declares an invalid argument schema.
    #[error("invalid argument schema for `{action}`: {source}")]
    InvalidArgumentSchema {
        action: String,
        #[source]
        source: SchemaError,
    },

    /// A manifest on disk could not be parsed.
    #[error("invalid manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("group handler for `{group}` failed: {source}")]
    Handler {
        group: String,
        #[source]
        source: HandlerError,
    },

    #[error("option `{name}` failed: {source}")]
    Interceptor {
        name: String,
        #[source]
        source: OptionError,
    },

    #[error("action `{action}` failed: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// The message-table entry describing this error.
    pub fn message(&self) -> Message {
        match self {
            Self::ActionNotFound { .. } => Message::ActionDoesNotExist,
            Self::DuplicateAction { .. } => Message::DuplicateAction,
            Self::InvalidArgumentSchema { .. } => Message::OptionalArgsMustBeAtEnd,
            Self::InvalidManifest { .. } => Message::InvalidManifest,
            Self::Handler { .. } => Message::HandlerFailed,
            Self::Interceptor { .. } => Message::OptionFailed,
            Self::Action { .. } => Message::ActionFailed,
            Self::Io { .. } => Message::IoFailure,
        }
    }

    /// Stable identifying code, e.g. `AR0008`.
    pub fn code(&self) -> String {
        self.message().code()
    }

    /// Localized `CODE: text` line.
    pub fn log_line(&self, locale: &str) -> String {
        let message = self.message();
        match self {
            Self::ActionNotFound { .. } => message.log_line(locale, &[]),
            Self::DuplicateAction { path } => {
                message.log_line(locale, &[&path.display().to_string()])
            }
            Self::InvalidArgumentSchema { action, source } => {
                format!("{} ({action}: {source})", message.log_line(locale, &[]))
            }
            Self::InvalidManifest { path, message: detail } => {
                message.log_line(locale, &[&path.display().to_string(), detail])
            }
            Self::Handler { group, source } => {
                message.log_line(locale, &[group, &source.to_string()])
            }
            Self::Interceptor { name, source } => {
                message.log_line(locale, &[name, &source.to_string()])
            }
            Self::Action { action, source } => {
                message.log_line(locale, &[action, &source.to_string()])
            }
            Self::Io { path, source } => {
                message.log_line(locale, &[&path.display().to_string(), &source.to_string()])
            }
        }
    }

    /// Exit status of a failed leaf process, if that is what happened.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Self::Action {
                source: ActionError::Failed { status },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for results with [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let not_found = ResolveError::ActionNotFound {
            path: PathBuf::from("/tmp/x"),
        };
        assert_eq!(not_found.code(), "AR0008");

        let duplicate = ResolveError::DuplicateAction {
            path: PathBuf::from("/tmp/x"),
        };
        assert_eq!(duplicate.code(), "AR0009");

        let schema = ResolveError::InvalidArgumentSchema {
            action: "deploy".into(),
            source: SchemaError::EmptyName,
        };
        assert_eq!(schema.code(), "AR0004");
    }

    #[test]
    fn test_exit_status_only_for_failed_processes() {
        let failed = ResolveError::Action {
            action: "build".into(),
            source: ActionError::Failed { status: 3 },
        };
        assert_eq!(failed.exit_status(), Some(3));

        let other = ResolveError::Action {
            action: "build".into(),
            source: ActionError::Other("boom".into()),
        };
        assert_eq!(other.exit_status(), None);
    }

    #[test]
    fn test_log_line_is_localized() {
        let err = ResolveError::DuplicateAction {
            path: PathBuf::from("deploy"),
        };
        assert_eq!(
            err.log_line("en-us"),
            "AR0009: A group and an action share the name \"deploy\""
        );
    }
}
