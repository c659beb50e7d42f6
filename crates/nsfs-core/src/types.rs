//! Filesystem execution context shared across the control plane.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flavor of the filesystem backing the config directory.
///
/// A clustered (GPFS-style) backend needs an extra linkat-with-replace step
/// after the atomic rename so that all cluster nodes observe the replacement
/// as a single transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigRootBackend {
    /// Plain POSIX filesystem; rename(2) alone is atomic enough.
    #[default]
    None,
    /// IBM Spectrum Scale (GPFS) clustered filesystem.
    Gpfs,
}

impl ConfigRootBackend {
    /// Parse the CLI / environment spelling of the backend flag.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NsfsError::Config`] for unrecognized values.
    pub fn parse(value: &str) -> Result<Self, crate::NsfsError> {
        match value {
            "" | "none" => Ok(Self::None),
            "GPFS" => Ok(Self::Gpfs),
            other => Err(crate::NsfsError::Config(format!(
                "unknown config_root_backend: {other} (expected 'none' or 'GPFS')"
            ))),
        }
    }
}

impl fmt::Display for ConfigRootBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Gpfs => f.write_str("GPFS"),
        }
    }
}

/// The filesystem identity a piece of work executes under.
///
/// Exactly one form is representable by construction: either a concrete
/// uid/gid pair or a distinguished name still to be resolved through the
/// host user database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsIdentity {
    /// Concrete numeric identity.
    UidGid {
        /// Effective user id for filesystem access.
        uid: u32,
        /// Effective group id for filesystem access.
        gid: u32,
    },
    /// A system user name resolved to uid/gid at probe time.
    DistinguishedName(String),
}

impl fmt::Display for FsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UidGid { uid, gid } => write!(f, "{uid}:{gid}"),
            Self::DistinguishedName(name) => f.write_str(name),
        }
    }
}

/// Execution context for filesystem operations.
///
/// Carries the backend flavor of the target filesystem and the identity the
/// operation should bear. Constructed per operation; never stored globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsContext {
    /// Backend flavor of the filesystem being touched.
    pub backend: ConfigRootBackend,
    /// Identity the operation executes under, if different from the process.
    pub identity: Option<FsIdentity>,
}

impl FsContext {
    /// Context for work done under the service's own identity.
    #[must_use]
    pub fn service(backend: ConfigRootBackend) -> Self {
        Self {
            backend,
            identity: None,
        }
    }

    /// Context for work done under a specific account identity.
    #[must_use]
    pub fn with_identity(backend: ConfigRootBackend, identity: FsIdentity) -> Self {
        Self {
            backend,
            identity: Some(identity),
        }
    }
}
