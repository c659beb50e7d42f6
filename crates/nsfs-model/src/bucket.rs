//! The persisted bucket record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bucket versioning status, serialized in the S3 spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// Versioning has never been enabled on this bucket.
    #[default]
    #[serde(rename = "DISABLED")]
    Disabled,
    /// Versioning is currently enabled.
    #[serde(rename = "ENABLED")]
    Enabled,
    /// Versioning was previously enabled but is now suspended.
    #[serde(rename = "SUSPENDED")]
    Suspended,
}

/// The persisted bucket record (`buckets/<name>.json`).
///
/// `owner_account` is the `_id` of the owning account; `bucket_owner` is the
/// account name, denormalized for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Unique record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Globally unique bucket name; doubles as the config file name.
    pub name: String,
    /// Owning system name.
    pub system_owner: String,
    /// Owning account name (display only).
    pub bucket_owner: String,
    /// `_id` of the owning account.
    pub owner_account: String,
    /// Versioning state of the bucket.
    pub versioning: VersioningStatus,
    /// Absolute directory holding the bucket's contents.
    pub path: String,
    /// Whether bucket add creates the underlying directory.
    pub should_create_underlying_storage: bool,
    /// When the bucket was created (RFC 3339).
    pub creation_date: DateTime<Utc>,
    /// Free-form bucket tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// S3 bucket policy, stored as opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_policy: Option<serde_json::Value>,
    /// Encryption configuration, stored as opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<serde_json::Value>,
    /// Static website configuration, stored as opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<serde_json::Value>,
    /// Filesystem backend override for this bucket's path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_backend: Option<String>,
}

impl Bucket {
    /// Create a fresh record with a generated `_id` and the current time.
    #[must_use]
    pub fn new(name: String, owner_account: String, bucket_owner: String, path: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            system_owner: bucket_owner.clone(),
            bucket_owner,
            owner_account,
            versioning: VersioningStatus::default(),
            path,
            should_create_underlying_storage: false,
            creation_date: Utc::now(),
            tag: None,
            s3_policy: None,
            encryption: None,
            website: None,
            fs_backend: None,
        }
    }
}
