//! Error types for the config filesystem.

use std::path::PathBuf;

/// Errors produced by [`crate::ConfigFs`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFsError {
    /// A create targeted a name that already exists.
    #[error("config entry already exists: {name}")]
    AlreadyExists {
        /// The conflicting entry name.
        name: String,
    },

    /// A read or update targeted a name that does not exist.
    #[error("config entry not found: {name}")]
    NotFound {
        /// The missing entry name.
        name: String,
    },

    /// An access-key symlink already exists and points at a different account.
    #[error("access key already exists: {access_key}")]
    AccessKeyAlreadyExists {
        /// The conflicting access key.
        access_key: String,
    },

    /// A config file exists but does not parse as the expected record.
    #[error("malformed config file {path}: {source}")]
    Malformed {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
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

impl ConfigFsError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for config filesystem operations.
pub type ConfigFsResult<T> = Result<T, ConfigFsError>;
