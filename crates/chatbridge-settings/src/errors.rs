//! Settings errors.

use thiserror::Error;

/// Why the settings file could not be loaded or saved.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Filesystem access failed.
    #[error("settings file I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON, or a value has the wrong shape.
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shorthand used across this crate.
pub type Result<T> = std::result::Result<T, SettingsError>;
