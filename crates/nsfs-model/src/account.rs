//! The persisted account record and its filesystem identity block.

use chrono::{DateTime, Utc};
use nsfs_core::FsIdentity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An access-key pair published for one account.
///
/// The access key is a 20-character alphanumeric identifier, globally unique
/// across accounts; the secret is a 40-character shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyPair {
    /// The 20-character access key id.
    pub access_key: String,
    /// The 40-character secret key.
    pub secret_key: String,
}

/// The filesystem identity block of an account.
///
/// Exactly one identity form must be populated: either `uid` + `gid`, or
/// `distinguished_name`. The record keeps all three keys so that the JSON
/// stays bit-compatible; [`Self::identity`] is the checked accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsfsAccountConfig {
    /// Effective user id, when the numeric form is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Effective group id, when the numeric form is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    /// System user name, when the distinguished-name form is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinguished_name: Option<String>,
    /// Directory the account creates buckets under; must be accessible to
    /// the identity above.
    pub new_buckets_path: String,
}

impl NsfsAccountConfig {
    /// The identity this block describes, or `None` when zero or both
    /// forms are populated.
    #[must_use]
    pub fn identity(&self) -> Option<FsIdentity> {
        match (self.uid, self.gid, self.distinguished_name.as_ref()) {
            (Some(uid), Some(gid), None) => Some(FsIdentity::UidGid { uid, gid }),
            (None, None, Some(name)) => Some(FsIdentity::DistinguishedName(name.clone())),
            _ => None,
        }
    }
}

/// The persisted account record (`accounts/<name>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Unique account name; doubles as the config file name.
    pub name: String,
    /// Contact email, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the account was created (RFC 3339).
    pub creation_date: DateTime<Utc>,
    /// Access-key pairs, each published as a symlink in `access_keys/`.
    pub access_keys: Vec<AccessKeyPair>,
    /// Filesystem identity and bucket-creation root.
    pub nsfs_account_config: NsfsAccountConfig,
    /// Whether the account may create buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_bucket_creation: Option<bool>,
}

impl Account {
    /// Create a fresh record with a generated `_id` and the current time.
    #[must_use]
    pub fn new(name: String, config: NsfsAccountConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: None,
            creation_date: Utc::now(),
            access_keys: Vec::new(),
            nsfs_account_config: config,
            allow_bucket_creation: None,
        }
    }

    /// Whether any of the account's pairs carries this access key.
    #[must_use]
    pub fn has_access_key(&self, access_key: &str) -> bool {
        self.access_keys.iter().any(|p| p.access_key == access_key)
    }

    /// Whether bucket creation is allowed (defaults to true when unset).
    #[must_use]
    pub fn may_create_buckets(&self) -> bool {
        self.allow_bucket_creation.unwrap_or(true)
    }
}
