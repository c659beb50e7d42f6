//! Error types for identity resolution and access probes.

use std::path::PathBuf;

/// Errors produced by identity resolution and filesystem probes.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The distinguished name does not resolve through the user database.
    #[error("invalid distinguished name: {name}")]
    InvalidDistinguishedName {
        /// The name that failed to resolve.
        name: String,
    },

    /// The probed path is missing, not a directory, or not read/writable
    /// under the requested identity.
    #[error("path {path} is not accessible as {uid}:{gid}: {reason}")]
    Inaccessible {
        /// The directory that was probed.
        path: PathBuf,
        /// Uid the probe ran under.
        uid: u32,
        /// Gid the probe ran under.
        gid: u32,
        /// What the probe observed.
        reason: String,
    },

    /// Filesystem I/O failure outside the probe's access semantics.
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

/// Convenience result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
