//! Error types for the upgrade controller.

/// Errors produced by upgrade operations.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// The upgrade (or its pre-conditions) failed; `cause` is the operator-
    /// facing explanation.
    #[error("{cause}")]
    Failed {
        /// Operator-facing cause.
        cause: String,
    },

    /// A version string did not parse.
    #[error("invalid version: {version}")]
    InvalidVersion {
        /// The offending version string.
        version: String,
    },

    /// The config filesystem failed underneath the controller.
    #[error(transparent)]
    ConfigFs(#[from] nsfs_configfs::ConfigFsError),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UpgradeError {
    /// Build a [`UpgradeError::Failed`] from anything displayable.
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::Failed {
            cause: cause.into(),
        }
    }
}

/// Convenience result type for upgrade operations.
pub type UpgradeResult<T> = Result<T, UpgradeError>;
