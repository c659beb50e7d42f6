//! Typed option structs and strict option parsing.
//!
//! Options arrive as one JSON object, assembled from CLI flags or loaded
//! via `--from_file`. Parsing is strict: an unknown key fails with
//! `InvalidArgument` and a wrong-typed value with `InvalidArgumentType`,
//! in both cases before any side effect.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::response::{ManageError, ManageErrorCode};

/// Options accepted by account actions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountOptions {
    /// Account name (identifier for update / status / delete).
    pub name: Option<String>,
    /// Numeric identity: uid.
    pub uid: Option<u32>,
    /// Numeric identity: gid.
    pub gid: Option<u32>,
    /// Distinguished-name identity.
    pub user: Option<String>,
    /// Directory the account creates buckets under.
    pub new_buckets_path: Option<String>,
    /// Explicit access key (20 alphanumeric characters).
    pub access_key: Option<String>,
    /// Explicit secret key (40 base64-alphabet characters).
    pub secret_key: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Rotate to freshly generated keys on update.
    pub regenerate: Option<bool>,
    /// Whether the account may create buckets.
    pub allow_bucket_creation: Option<bool>,
    /// Full records in listings instead of names only.
    pub wide: Option<bool>,
    /// Include secret keys in status replies.
    pub show_secrets: Option<bool>,
}

/// Options accepted by bucket actions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketOptions {
    /// Bucket name (identifier for update / status / delete).
    pub name: Option<String>,
    /// Name of the owning account.
    pub owner: Option<String>,
    /// Absolute directory holding the bucket's contents.
    pub path: Option<String>,
    /// Versioning state (`DISABLED`, `ENABLED`, `SUSPENDED`).
    pub versioning: Option<String>,
    /// Create the underlying `path` directory on add.
    pub should_create_underlying_storage: Option<bool>,
    /// Free-form bucket tag.
    pub tag: Option<String>,
    /// Filesystem backend override.
    pub fs_backend: Option<String>,
    /// Full records in listings instead of names only.
    pub wide: Option<bool>,
}

/// Options accepted by upgrade actions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeOptions {
    /// The package version the caller believes is deployed everywhere.
    pub expected_version: Option<String>,
    /// Comma-separated hostnames the caller believes form the deployment.
    pub expected_hosts: Option<String>,
    /// Bypass the cluster verification gates.
    pub skip_verification: Option<bool>,
    /// Operator-supplied scripts directory.
    pub custom_upgrade_scripts_dir: Option<String>,
}

/// The AND-conjoined account list filter.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Match on uid.
    pub uid: Option<u32>,
    /// Match on gid.
    pub gid: Option<u32>,
    /// Match on distinguished name.
    pub user: Option<String>,
    /// Match on access key.
    pub access_key: Option<String>,
    /// Match on name.
    pub name: Option<String>,
}

impl ListFilter {
    /// Build the filter from account options.
    #[must_use]
    pub fn from_account_options(options: &AccountOptions) -> Self {
        Self {
            uid: options.uid,
            gid: options.gid,
            user: options.user.clone(),
            access_key: options.access_key.clone(),
            name: options.name.clone(),
        }
    }

    /// Whether the account satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, account: &nsfs_model::Account) -> bool {
        let config = &account.nsfs_account_config;
        if self.uid.is_some() && config.uid != self.uid {
            return false;
        }
        if self.gid.is_some() && config.gid != self.gid {
            return false;
        }
        if let Some(user) = &self.user {
            if config.distinguished_name.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(access_key) = &self.access_key {
            if !account.has_access_key(access_key) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &account.name != name {
                return false;
            }
        }
        true
    }
}

/// Parse an options object strictly into `T`.
///
/// # Errors
///
/// `InvalidArgument` for unknown keys, `InvalidArgumentType` for values of
/// the wrong type.
pub fn parse_options<T: DeserializeOwned>(options: serde_json::Value) -> Result<T, ManageError> {
    serde_json::from_value(options).map_err(|e| {
        let detail = e.to_string();
        if detail.contains("unknown field") {
            ManageError::new(
                ManageErrorCode::InvalidArgument,
                format!("unknown option: {detail}"),
            )
        } else {
            ManageError::new(
                ManageErrorCode::InvalidArgumentType,
                format!("bad option value: {detail}"),
            )
        }
    })
}
