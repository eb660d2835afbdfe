//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur while reading, editing or saving the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry file is not valid JSON, or could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured exclusion pattern does not compile.
    #[error("invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A registration with an empty name or path.
    #[error("invalid registry entry: {0}")]
    InvalidEntry(String),

    /// No configuration directory could be determined for this platform.
    #[error("no configuration directory available; pass a registry path explicitly")]
    NoConfigDir,
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
