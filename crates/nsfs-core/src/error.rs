//! Error types shared across the NSFS control plane.

use std::path::PathBuf;

/// Core error type for NSFS infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum NsfsError {
    /// Filesystem I/O failure, with the path that was being touched.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file exists but does not parse as the expected JSON record.
    #[error("malformed config file {path}: {source}")]
    Malformed {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NsfsError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is an I/O "not found".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Convenience result type for NSFS operations.
pub type NsfsResult<T> = Result<T, NsfsError>;
