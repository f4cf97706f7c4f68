//! Error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for hosts file operations.
pub type Result<T> = std::result::Result<T, QhError>;

#[derive(Debug, Error)]
pub enum QhError {
    /// The hosts file could not be read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No usable IPv4 address for the requested target.
    #[error("failed to resolve {target}: {reason}")]
    Resolution { target: String, reason: String },

    #[error("invalid hostname: {0:?}")]
    InvalidName(String),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Interrupt notification could not be installed.
    #[error("failed to listen for interrupt: {0}")]
    Signal(#[source] io::Error),
}

impl QhError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
    }
}
