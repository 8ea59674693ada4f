//! Error types for costlens infrastructure.
//!
//! [`CoreError`] covers the configuration, logging, and filesystem concerns
//! shared across the workspace. The analytics crate carries its own error
//! type; this one stays small.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Infrastructure errors: configuration, paths, filesystem.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The config file exists but did not parse
    #[error("could not parse config {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// A parsed config value is out of range
    #[error("bad config value: {message}")]
    ConfigValidation { message: String },

    /// Filesystem operation failed
    #[error("IO error while {operation} {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required directory could not be created
    #[error("could not create directory {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No home directory to anchor `~/.costlens` under
    #[error("no home directory available")]
    HomeDirUnavailable,

    /// Invariant violation inside costlens itself
    #[error("internal failure: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Wrap an I/O error with the operation and path it came from.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Build an [`CoreError::Internal`] from any message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the two configuration variants.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }
}
