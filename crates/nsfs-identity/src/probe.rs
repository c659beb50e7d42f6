//! Filesystem access probes under a borrowed identity.

use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Uid, setfsgid, setfsuid};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{IdentityError, IdentityResult};

/// Restores the calling thread's filesystem identity when dropped.
///
/// `setfsuid`/`setfsgid` affect only the current thread, and the blocking
/// pool reuses threads, so the previous identity must be back in place
/// before this frame returns, including the error and panic paths.
struct ScopedFsIdentity {
    prev_uid: Uid,
    prev_gid: Gid,
}

impl ScopedFsIdentity {
    fn acquire(uid: u32, gid: u32) -> Self {
        // Group first: once fsuid drops, the thread may no longer have the
        // privilege to change fsgid.
        let prev_gid = setfsgid(Gid::from_raw(gid));
        let prev_uid = setfsuid(Uid::from_raw(uid));
        trace!(uid, gid, "acquired thread filesystem identity");
        Self { prev_uid, prev_gid }
    }
}

impl Drop for ScopedFsIdentity {
    fn drop(&mut self) {
        setfsuid(self.prev_uid);
        setfsgid(self.prev_gid);
        trace!("restored thread filesystem identity");
    }
}

/// Probe `path` for read and write access under `uid:gid`.
///
/// The probe runs on a blocking thread whose filesystem identity is flipped
/// for the duration of the two checks: a directory read, and a
/// create-then-unlink of a uniquely named probe file.
///
/// # Errors
///
/// [`IdentityError::Inaccessible`] when the path is missing, not a
/// directory, or either probe is refused under the identity.
pub async fn probe_access(path: &Path, uid: u32, gid: u32) -> IdentityResult<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || probe_blocking(&path, uid, gid))
        .await
        .map_err(|e| IdentityError::Internal(anyhow::anyhow!("probe task failed: {e}")))?
}

fn probe_blocking(path: &Path, uid: u32, gid: u32) -> IdentityResult<()> {
    let inaccessible = |reason: String| IdentityError::Inaccessible {
        path: path.to_path_buf(),
        uid,
        gid,
        reason,
    };

    let _identity = ScopedFsIdentity::acquire(uid, gid);

    // Existence and type are checked under the identity as well: a path the
    // identity cannot even stat is just as unusable.
    let metadata = std::fs::metadata(path).map_err(|e| inaccessible(format!("stat: {e}")))?;
    if !metadata.is_dir() {
        return Err(inaccessible("not a directory".to_owned()));
    }

    // Read probe.
    std::fs::read_dir(path).map_err(|e| inaccessible(format!("read: {e}")))?;

    // Write probe: create and immediately unlink a uniquely named file.
    let probe_path = probe_file_path(path);
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path)
        .map_err(|e| inaccessible(format!("write: {e}")))?;
    std::fs::remove_file(&probe_path).map_err(|e| IdentityError::Io {
        path: probe_path.clone(),
        source: e,
    })?;

    debug!(path = %path.display(), uid, gid, "access probe passed");
    Ok(())
}

fn probe_file_path(dir: &Path) -> PathBuf {
    dir.join(format!(".nsfs_access_probe_{}", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own_ids() -> (u32, u32) {
        (
            nix::unistd::geteuid().as_raw(),
            nix::unistd::getegid().as_raw(),
        )
    }

    #[tokio::test]
    async fn test_should_pass_probe_on_own_directory() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let (uid, gid) = own_ids();
        probe_access(dir.path(), uid, gid)
            .await
            .unwrap_or_else(|e| panic!("probe: {e}"));
    }

    #[tokio::test]
    async fn test_should_fail_probe_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let missing = dir.path().join("nope");
        let (uid, gid) = own_ids();
        let err = probe_access(&missing, uid, gid).await;
        assert!(matches!(err, Err(IdentityError::Inaccessible { .. })));
    }

    #[tokio::test]
    async fn test_should_fail_probe_on_plain_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap_or_else(|e| panic!("write: {e}"));

        let (uid, gid) = own_ids();
        let err = probe_access(&file, uid, gid).await;
        assert!(matches!(
            err,
            Err(IdentityError::Inaccessible { reason, .. }) if reason.contains("not a directory")
        ));
    }

    #[tokio::test]
    async fn test_should_fail_probe_on_unwritable_directory() {
        // Root bypasses permission bits; the check is only meaningful
        // unprivileged.
        if nix::unistd::geteuid().is_root() {
            return;
        }

        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let mut perms = std::fs::metadata(dir.path())
            .unwrap_or_else(|e| panic!("stat: {e}"))
            .permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o500);
        std::fs::set_permissions(dir.path(), perms).unwrap_or_else(|e| panic!("chmod: {e}"));

        let (uid, gid) = own_ids();
        let err = probe_access(dir.path(), uid, gid).await;
        assert!(matches!(
            err,
            Err(IdentityError::Inaccessible { reason, .. }) if reason.contains("write")
        ));
    }

    #[tokio::test]
    async fn test_should_leave_no_probe_files_behind() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let (uid, gid) = own_ids();
        probe_access(dir.path(), uid, gid)
            .await
            .unwrap_or_else(|e| panic!("probe: {e}"));

        let count = std::fs::read_dir(dir.path())
            .map(|it| it.count())
            .unwrap_or(usize::MAX);
        assert_eq!(count, 0);
    }
}
