//! On-disk registry format.
//!
//! The registry is a small JSON document mapping root names to tree
//! directories, plus the listing exclusion pattern and the message locale.
//!
//! # Example JSON
//!
//! ```json
//! {
//!     "actions": {
//!         "deploy": "/srv/actions/deploy",
//!         "db": "/home/me/db-tasks"
//!     },
//!     "excludes": "^(index\\.yml|options|\\..*)$",
//!     "locale": "en-us"
//! }
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use action_runner_core::{DEFAULT_EXCLUDES, DEFAULT_LOCALE};
use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_excludes() -> String {
    DEFAULT_EXCLUDES.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

/// Contents of the registry file. Missing keys take their defaults.
///
/// # Examples
///
/// ```
/// use action_runner_registry::RegistryConfig;
///
/// let config: RegistryConfig = serde_json::from_str(r#"{"actions": {"ops": "/srv/ops"}}"#).unwrap();
/// assert_eq!(config.actions["ops"].to_str(), Some("/srv/ops"));
/// assert_eq!(config.locale, "en-us");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root name to tree directory.
    #[serde(default)]
    pub actions: BTreeMap<String, PathBuf>,
    /// Entries whose names match are hidden from group listings and never
    /// resolve as commands.
    #[serde(default = "default_excludes")]
    pub excludes: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
            excludes: default_excludes(),
            locale: default_locale(),
        }
    }
}

impl RegistryConfig {
    /// Loads the registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be read,
    /// or [`Json`](crate::RegistryError::Json) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the registry as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be
    /// written, or [`Json`](crate::RegistryError::Json) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
