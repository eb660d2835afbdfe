//! The registry of named command-tree roots.
//!
//! A [`Registry`] wraps a [`RegistryConfig`] together with the file it was
//! read from. Opening a missing registry creates it with defaults, creating
//! the parent directory if needed.
//!
//! # Quick start
//!
//! ```no_run
//! use action_runner_registry::Registry;
//!
//! let mut registry = Registry::open(Registry::default_path().unwrap()).unwrap();
//! registry.register("deploy", "/srv/actions/deploy").unwrap();
//! registry.save().unwrap();
//!
//! if let Some(root) = registry.lookup("deploy") {
//!     println!("deploy lives at {}", root.display());
//! }
//! ```

mod config;
mod error;

use std::path::{Path, PathBuf};

use action_runner_core::{DEFAULT_LOCALE, Message};
use regex::Regex;
use tracing::{debug, info};

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "action-runner";

/// File name of the registry inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    config: RegistryConfig,
}

impl Registry {
    /// `<config dir>/action-runner/config.json`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoConfigDir`] if the platform has no config dir.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(RegistryError::NoConfigDir)
    }

    /// Reads the registry at `path`, creating a default one if it does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// I/O failures and malformed JSON.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_file() {
            debug!(path = %path.display(), "loading registry");
            let config = RegistryConfig::load(&path)?;
            return Ok(Self { path, config });
        }

        info!(
            code = %Message::CreateNewConfig.code(),
            path = %path.display(),
            "{}",
            Message::CreateNewConfig.text(DEFAULT_LOCALE)
        );
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                std::fs::create_dir_all(parent)?;
                info!(
                    code = %Message::CreateConfigDirectory.code(),
                    "{}",
                    Message::CreateConfigDirectory
                        .render(DEFAULT_LOCALE, &[&parent.display().to_string()])
                );
            }
        }

        let registry = Self {
            path,
            config: RegistryConfig::default(),
        };
        registry.save()?;
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Root directory registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Path> {
        self.config.actions.get(name).map(PathBuf::as_path)
    }

    /// All registrations, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.config
            .actions
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn is_empty(&self) -> bool {
        self.config.actions.is_empty()
    }

    /// Registers (or replaces) `name`. Relative paths are made absolute
    /// against the current directory. Does not save.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidEntry`] for an empty name or path.
    pub fn register(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidEntry("name cannot be empty".into()));
        }
        if path.as_os_str().is_empty() {
            return Err(RegistryError::InvalidEntry(format!(
                "path for `{name}` cannot be empty"
            )));
        }
        let path = std::path::absolute(path)?;
        debug!(name, path = %path.display(), "registering root");
        self.config.actions.insert(name.to_string(), path);
        Ok(())
    }

    /// Removes `name`. Returns whether it was registered. Does not save.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.config.actions.remove(name).is_some()
    }

    /// The compiled listing exclusion pattern.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidPattern`] if the configured pattern is not a
    /// valid regex.
    pub fn exclusion_pattern(&self) -> Result<Regex> {
        Ok(Regex::new(&self.config.excludes)?)
    }

    pub fn locale(&self) -> &str {
        &self.config.locale
    }

    /// Writes the registry back to the file it was opened from.
    pub fn save(&self) -> Result<()> {
        self.config.save(&self.path)
    }
}
