//! Localized message table with stable identifying codes.
//!
//! Every user-facing message has a numeric id; its code is `AR` followed by
//! the id padded to four digits (`AR0008`). Text is looked up by locale and
//! falls back to [`DEFAULT_LOCALE`]. Positional placeholders `{0}`, `{1}`,
//! ... are replaced by the supplied arguments.
//!
//! ```
//! use action_runner_core::Message;
//!
//! assert_eq!(Message::ActionDoesNotExist.code(), "AR0008");
//! assert_eq!(
//!     Message::UnknownOption.render("en-us", &["force"]),
//!     "Unknown option \"force\""
//! );
//! ```

/// Locale used when a message has no text for the requested one.
pub const DEFAULT_LOCALE: &str = "en-us";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    CreateNewConfig,
    CreateConfigDirectory,
    OptionalArgsMustBeAtEnd,
    NoActionsDefined,
    ParentActionNotFound,
    AvailableActions,
    ActionDoesNotExist,
    DuplicateAction,
    WrongArguments,
    UnknownOption,
    InvalidManifest,
    HandlerFailed,
    OptionFailed,
    ActionFailed,
    IoFailure,
    AvailableCommands,
    ActionRegistered,
    ActionUnregistered,
    ActionNotRegistered,
}

impl Message {
    /// Numeric id. Never reuse or renumber an id.
    pub fn id(self) -> u16 {
        match self {
            Self::CreateNewConfig => 1,
            Self::CreateConfigDirectory => 2,
            Self::OptionalArgsMustBeAtEnd => 4,
            Self::NoActionsDefined => 5,
            Self::ParentActionNotFound => 6,
            Self::AvailableActions => 7,
            Self::ActionDoesNotExist => 8,
            Self::DuplicateAction => 9,
            Self::WrongArguments => 10,
            Self::UnknownOption => 11,
            Self::InvalidManifest => 12,
            Self::HandlerFailed => 13,
            Self::OptionFailed => 14,
            Self::ActionFailed => 15,
            Self::IoFailure => 16,
            Self::AvailableCommands => 17,
            Self::ActionRegistered => 18,
            Self::ActionUnregistered => 19,
            Self::ActionNotRegistered => 20,
        }
    }

    pub fn code(self) -> String {
        format!("AR{:04}", self.id())
    }

    fn translations(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::CreateNewConfig => &[("en-us", "Config does not exist. Creating new one...")],
            Self::CreateConfigDirectory => &[("en-us", "Created config directory at \"{0}\"")],
            Self::OptionalArgsMustBeAtEnd => {
                &[("en-us", "Optional arguments must be at the end of args")]
            }
            Self::NoActionsDefined => &[
                ("en-us", "No actions have been defined for action \"{0}\""),
                ("de-de", "Für die Aktion \"{0}\" sind keine Befehle definiert"),
            ],
            Self::ParentActionNotFound => &[
                ("en-us", "Parent action not found"),
                ("de-de", "Übergeordnete Aktion nicht gefunden"),
            ],
            Self::AvailableActions => &[
                ("en-us", "Available actions"),
                ("de-de", "Verfügbare Aktionen"),
            ],
            Self::ActionDoesNotExist => &[
                ("en-us", "Action does not exist"),
                ("de-de", "Aktion existiert nicht"),
            ],
            Self::DuplicateAction => &[(
                "en-us",
                "A group and an action share the name \"{0}\"",
            )],
            Self::WrongArguments => &[
                ("en-us", "Action called without the correct arguments"),
                ("de-de", "Aktion ohne die richtigen Argumente aufgerufen"),
            ],
            Self::UnknownOption => &[
                ("en-us", "Unknown option \"{0}\""),
                ("de-de", "Unbekannte Option \"{0}\""),
            ],
            Self::InvalidManifest => &[("en-us", "Invalid manifest \"{0}\": {1}")],
            Self::HandlerFailed => &[("en-us", "Group handler for \"{0}\" failed: {1}")],
            Self::OptionFailed => &[("en-us", "Option \"{0}\" failed: {1}")],
            Self::ActionFailed => &[("en-us", "Action \"{0}\" failed: {1}")],
            Self::IoFailure => &[("en-us", "I/O error at \"{0}\": {1}")],
            Self::AvailableCommands => &[
                ("en-us", "Available commands"),
                ("de-de", "Verfügbare Befehle"),
            ],
            Self::ActionRegistered => &[("en-us", "Registered action \"{0}\" at \"{1}\"")],
            Self::ActionUnregistered => &[("en-us", "Removed action \"{0}\"")],
            Self::ActionNotRegistered => &[("en-us", "No action named \"{0}\" is registered")],
        }
    }

    /// Raw text for `locale`, falling back to [`DEFAULT_LOCALE`].
    pub fn text(self, locale: &str) -> &'static str {
        let table = self.translations();
        table
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(locale))
            .or_else(|| table.iter().find(|(l, _)| *l == DEFAULT_LOCALE))
            .map(|(_, text)| *text)
            .unwrap_or_default()
    }

    /// Text with `{n}` placeholders filled from `args`.
    pub fn render(self, locale: &str, args: &[&str]) -> String {
        let mut text = self.text(locale).to_string();
        for (idx, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{idx}}}"), arg);
        }
        text
    }

    /// `CODE: text`, the form used for log and error lines.
    pub fn log_line(self, locale: &str, args: &[&str]) -> String {
        format!("{}: {}", self.code(), self.render(locale, args))
    }
}
