//! Error types for glacier workflows.

use std::path::PathBuf;

/// Errors produced by glacier tiering operations.
#[derive(Debug, thiserror::Error)]
pub enum GlacierError {
    /// The underlying WAL failed.
    #[error(transparent)]
    Wal(#[from] nsfs_wal::WalError),

    /// Filesystem I/O failure, with the path that was being touched.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The restore-status attribute exists but does not parse.
    #[error("malformed restore status on {path}: {source}")]
    MalformedStatus {
        /// The object carrying the attribute.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GlacierError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for glacier operations.
pub type GlacierResult<T> = Result<T, GlacierError>;
