//! Restore-status bookkeeping via extended attributes.
//!
//! Two attributes live on each object's data file:
//!
//! - `user.noobaa.restore.request`: the requested restore duration in
//!   days; present only while a request is queued in the restore WAL.
//! - `user.noobaa.restore.status`: JSON `{ongoing, expiry_time?}`;
//!   `ongoing: true` from request until the backend finishes,
//!   then `ongoing: false` with the expiry stamp.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{GlacierError, GlacierResult};

/// Attribute holding the requested restore duration in days.
const XATTR_RESTORE_REQUEST: &str = "user.noobaa.restore.request";

/// Attribute holding the JSON restore status.
const XATTR_RESTORE_STATUS: &str = "user.noobaa.restore.status";

/// The restore state of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStatus {
    /// Whether a restore is still in flight.
    pub ongoing: bool,
    /// When the restored copy expires; set once the restore completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<Utc>>,
}

impl RestoreStatus {
    /// Status written when a restore request is queued.
    #[must_use]
    pub fn ongoing() -> Self {
        Self {
            ongoing: true,
            expiry_time: None,
        }
    }

    /// Status written when the backend finished restoring.
    #[must_use]
    pub fn restored_until(expiry_time: DateTime<Utc>) -> Self {
        Self {
            ongoing: false,
            expiry_time: Some(expiry_time),
        }
    }

    /// Whether the restored copy is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.ongoing && self.expiry_time.is_some_and(|expiry| expiry < now)
    }
}

/// Read the restore status of an object, or `None` when never restored.
pub async fn get_restore_status(path: &Path) -> GlacierResult<Option<RestoreStatus>> {
    let Some(bytes) = read_xattr(path, XATTR_RESTORE_STATUS).await? else {
        return Ok(None);
    };
    let status = serde_json::from_slice(&bytes).map_err(|e| GlacierError::MalformedStatus {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(status))
}

/// Write the restore status of an object.
pub async fn set_restore_status(path: &Path, status: &RestoreStatus) -> GlacierResult<()> {
    let bytes = serde_json::to_vec(status)
        .map_err(|e| GlacierError::Internal(anyhow::anyhow!("serialize restore status: {e}")))?;
    write_xattr(path, XATTR_RESTORE_STATUS, bytes).await
}

/// Read the queued restore duration, or `None` when no request is pending.
pub async fn get_restore_request(path: &Path) -> GlacierResult<Option<u32>> {
    let Some(bytes) = read_xattr(path, XATTR_RESTORE_REQUEST).await? else {
        return Ok(None);
    };
    let days = std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            GlacierError::Internal(anyhow::anyhow!(
                "malformed restore request on {}",
                path.display()
            ))
        })?;
    Ok(Some(days))
}

/// Record the requested restore duration on the object.
pub async fn set_restore_request(path: &Path, days: u32) -> GlacierResult<()> {
    write_xattr(path, XATTR_RESTORE_REQUEST, days.to_string().into_bytes()).await
}

/// Remove the queued-request marker. Idempotent.
pub async fn clear_restore_request(path: &Path) -> GlacierResult<()> {
    let path_buf = path.to_path_buf();
    tokio::task::spawn_blocking(move || match xattr::remove(&path_buf, XATTR_RESTORE_REQUEST) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(nodata_errno()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GlacierError::io(path_buf.clone(), e)),
    })
    .await
    .map_err(|e| GlacierError::Internal(anyhow::anyhow!("xattr task failed: {e}")))?
}

async fn read_xattr(path: &Path, name: &'static str) -> GlacierResult<Option<Vec<u8>>> {
    let path_buf = path.to_path_buf();
    tokio::task::spawn_blocking(move || match xattr::get(&path_buf, name) {
        Ok(value) => Ok(value),
        Err(e) => Err(GlacierError::io(path_buf.clone(), e)),
    })
    .await
    .map_err(|e| GlacierError::Internal(anyhow::anyhow!("xattr task failed: {e}")))?
}

async fn write_xattr(path: &Path, name: &'static str, bytes: Vec<u8>) -> GlacierResult<()> {
    let path_buf = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        xattr::set(&path_buf, name, &bytes).map_err(|e| GlacierError::io(path_buf.clone(), e))
    })
    .await
    .map_err(|e| GlacierError::Internal(anyhow::anyhow!("xattr task failed: {e}")))??;
    trace!(path = %path.display(), name, "wrote xattr");
    Ok(())
}

/// "No such attribute" errno (ENODATA on Linux).
fn nodata_errno() -> i32 {
    61
}
