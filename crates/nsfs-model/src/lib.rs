//! On-disk record types for the NSFS control plane.
//!
//! Everything in this crate serializes bit-compatibly with existing
//! deployments: JSON key names are exact, including the `_id` key and the
//! SCREAMING_CASE enum spellings. Records are plain data; all mutation and
//! validation logic lives in the crates that own the workflows.

mod account;
mod bucket;
mod system;

pub use account::{AccessKeyPair, Account, NsfsAccountConfig};
pub use bucket::{Bucket, VersioningStatus};
pub use system::{
    ConfigDirPhase, ConfigDirUpgrade, ConfigDirectory, HostRecord, InProgressUpgrade,
    PackageUpgrade, SystemConfig, UpgradeHistory,
};
