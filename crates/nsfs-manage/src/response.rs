//! Wire-shaped responses and errors.
//!
//! Success: `{"response": {"code": ..., "reply": ...}}`.
//! Failure: `{"error": {"code": ..., "message": ..., "cause"?: ...}}`.

use serde::Serialize;

/// Success codes returned in `response.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseCode {
    /// Account created.
    AccountCreated,
    /// Account updated.
    AccountUpdated,
    /// Account deleted.
    AccountDeleted,
    /// Single-account fetch.
    AccountStatus,
    /// Account listing.
    AccountList,
    /// Bucket created.
    BucketCreated,
    /// Bucket updated.
    BucketUpdated,
    /// Bucket deleted.
    BucketDeleted,
    /// Single-bucket fetch.
    BucketStatus,
    /// Bucket listing.
    BucketList,
    /// Upgrade completed (or was a no-op).
    UpgradeSuccessful,
    /// Upgrade status fetch.
    UpgradeStatus,
    /// Upgrade history fetch.
    UpgradeHistory,
}

/// Error codes returned in `error.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ManageErrorCode {
    /// An option is unknown or its value is not acceptable.
    InvalidArgument,
    /// An option value has the wrong type.
    InvalidArgumentType,
    /// The action needs a `name` (or equivalent identifier) and none was given.
    MissingIdentifier,
    /// The target already exists.
    AlreadyExists,
    /// The target does not exist.
    NotFound,
    /// The operation is refused in the current state.
    AccessDenied,
    /// An access key is already taken by a different account.
    AccessKeyAlreadyExists,
    /// `new_buckets_path` failed the identity-scoped access probe.
    InaccessibleAccountNewBucketsPath,
    /// The distinguished name does not resolve to a system user.
    InvalidAccountDistinguishedName,
    /// `access_key` was supplied without `secret_key` (or is malformed).
    AccountAccessKeyFlagComplexity,
    /// `secret_key` was supplied without `access_key` (or is malformed).
    AccountSecretKeyFlagComplexity,
    /// The account still owns buckets.
    AccountDeleteForbiddenHasBuckets,
    /// `upgrade start` failed.
    UpgradeFailed,
    /// `upgrade status` failed.
    UpgradeStatusFailed,
    /// `upgrade history` failed.
    UpgradeHistoryFailed,
    /// Unknown upgrade action.
    InvalidUpgradeAction,
    /// Filesystem I/O failure.
    #[serde(rename = "IO")]
    Io,
    /// A persisted record does not parse.
    Malformed,
}

/// A successful management response.
#[derive(Debug, Clone, Serialize)]
pub struct ManageResponse {
    /// Machine-readable success code.
    pub code: ResponseCode,
    /// Action-specific payload.
    pub reply: serde_json::Value,
}

impl ManageResponse {
    /// Build a response.
    #[must_use]
    pub fn new(code: ResponseCode, reply: serde_json::Value) -> Self {
        Self { code, reply }
    }

    /// The `{"response": {...}}` wire object.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({ "response": self })
    }
}

/// A structured management error.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ManageError {
    /// Machine-readable error code.
    pub code: ManageErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Underlying cause, when one adds information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ManageError {
    /// Build an error without a cause.
    pub fn new(code: ManageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Build an error with a cause.
    pub fn with_cause(
        code: ManageErrorCode,
        message: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// The `{"error": {...}}` wire object.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({ "error": self })
    }
}

// ---------------------------------------------------------------------------
// Conversions from crate-local errors
// ---------------------------------------------------------------------------

impl From<nsfs_configfs::ConfigFsError> for ManageError {
    fn from(err: nsfs_configfs::ConfigFsError) -> Self {
        use nsfs_configfs::ConfigFsError;
        match err {
            ConfigFsError::AlreadyExists { name } => Self::new(
                ManageErrorCode::AlreadyExists,
                format!("config entry already exists: {name}"),
            ),
            ConfigFsError::NotFound { name } => Self::new(
                ManageErrorCode::NotFound,
                format!("config entry not found: {name}"),
            ),
            ConfigFsError::AccessKeyAlreadyExists { access_key } => Self::new(
                ManageErrorCode::AccessKeyAlreadyExists,
                format!("access key already exists: {access_key}"),
            ),
            ConfigFsError::Malformed { path, source } => Self::with_cause(
                ManageErrorCode::Malformed,
                format!("malformed config file {}", path.display()),
                source.to_string(),
            ),
            ConfigFsError::Io { path, source } => Self::with_cause(
                ManageErrorCode::Io,
                format!("I/O error on {}", path.display()),
                source.to_string(),
            ),
            ConfigFsError::Internal(e) => Self::with_cause(
                ManageErrorCode::Io,
                "internal error".to_owned(),
                e.to_string(),
            ),
        }
    }
}

impl From<nsfs_identity::IdentityError> for ManageError {
    fn from(err: nsfs_identity::IdentityError) -> Self {
        use nsfs_identity::IdentityError;
        match err {
            IdentityError::InvalidDistinguishedName { name } => Self::new(
                ManageErrorCode::InvalidAccountDistinguishedName,
                format!("invalid account distinguished name: {name}"),
            ),
            IdentityError::Inaccessible { path, uid, gid, reason } => Self::with_cause(
                ManageErrorCode::InaccessibleAccountNewBucketsPath,
                format!(
                    "account new_buckets_path {} is inaccessible as {uid}:{gid}",
                    path.display()
                ),
                reason,
            ),
            IdentityError::Io { path, source } => Self::with_cause(
                ManageErrorCode::Io,
                format!("I/O error on {}", path.display()),
                source.to_string(),
            ),
            IdentityError::Internal(e) => Self::with_cause(
                ManageErrorCode::Io,
                "internal error".to_owned(),
                e.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_shape_response_wire_object() {
        let response = ManageResponse::new(
            ResponseCode::AccountCreated,
            serde_json::json!({"name": "a1"}),
        );
        let wire = response.to_wire();
        assert_eq!(wire["response"]["code"], "AccountCreated");
        assert_eq!(wire["response"]["reply"]["name"], "a1");
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn test_should_shape_error_wire_object() {
        let error = ManageError::with_cause(
            ManageErrorCode::UpgradeFailed,
            "config dir upgrade failed",
            "system does not exist",
        );
        let wire = error.to_wire();
        assert_eq!(wire["error"]["code"], "UpgradeFailed");
        assert_eq!(wire["error"]["cause"], "system does not exist");
        assert!(wire.get("response").is_none());
    }

    #[test]
    fn test_should_omit_absent_cause() {
        let error = ManageError::new(ManageErrorCode::NotFound, "missing");
        let wire = error.to_wire();
        assert!(wire["error"].get("cause").is_none());
    }

    #[test]
    fn test_should_spell_io_code_uppercase() {
        let error = ManageError::new(ManageErrorCode::Io, "disk");
        assert_eq!(error.to_wire()["error"]["code"], "IO");
    }

    #[test]
    fn test_should_map_configfs_errors() {
        let err: ManageError = nsfs_configfs::ConfigFsError::NotFound {
            name: "a1".to_owned(),
        }
        .into();
        assert_eq!(err.code, ManageErrorCode::NotFound);

        let err: ManageError = nsfs_configfs::ConfigFsError::AccessKeyAlreadyExists {
            access_key: "AKIA".to_owned(),
        }
        .into();
        assert_eq!(err.code, ManageErrorCode::AccessKeyAlreadyExists);
    }
}
