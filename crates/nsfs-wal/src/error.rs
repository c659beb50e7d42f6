//! Error types for the write-ahead log.

use std::path::PathBuf;

/// Errors produced by WAL operations.
#[derive(Debug, thiserror::Error)]
pub enum WalError {
    /// A record is empty or would break the newline framing.
    #[error("invalid WAL record: {reason}")]
    InvalidRecord {
        /// Why the record was rejected.
        reason: String,
    },

    /// Filesystem I/O failure, with the path that was being touched.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WalError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for WAL operations.
pub type WalResult<T> = Result<T, WalError>;
