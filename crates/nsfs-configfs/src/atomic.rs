//! The atomic-write primitive behind every config mutation.
//!
//! Contract: write a uniquely-named temp file in the same directory as the
//! target, fsync it, then rename over the target. A reader concurrently
//! opening the target sees either the old content or the new content,
//! never a mix. On clustered (GPFS) backends the replace goes through the
//! link primitive first, which revokes the cluster-wide name token before
//! the swap becomes visible on other nodes.

use std::fs::File;
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use nsfs_core::ConfigRootBackend;
use tempfile::NamedTempFile;
use tracing::trace;

/// Write `bytes` to `dir/target_name`, replacing any existing file.
///
/// An existing target keeps its uid/gid across the replace.
/// Blocking; callers dispatch through `spawn_blocking`.
pub(crate) fn write_replace(
    dir: &Path,
    target_name: &str,
    bytes: &[u8],
    backend: ConfigRootBackend,
) -> std::io::Result<()> {
    let target = dir.join(target_name);
    let temp = write_temp(dir, bytes)?;

    match std::fs::metadata(&target) {
        Ok(metadata) => {
            std::os::unix::fs::chown(temp.path(), Some(metadata.uid()), Some(metadata.gid()))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    match backend {
        ConfigRootBackend::None => {
            temp.persist(&target).map_err(|e| e.error)?;
        }
        ConfigRootBackend::Gpfs => {
            // link(2) first: GPFS revokes the name token on link, so remote
            // nodes observe the swap as one transition. EEXIST means the
            // target is live and rename must do the replace.
            match std::fs::hard_link(temp.path(), &target) {
                Ok(()) => {
                    temp.close()?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    temp.persist(&target).map_err(|e| e.error)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    sync_dir(dir)?;
    trace!(target = %target.display(), "atomic replace committed");
    Ok(())
}

/// Write `bytes` to `dir/target_name`, failing if the target already exists.
///
/// Uses link-based no-clobber persistence so two racing creators are
/// linearized by the kernel; exactly one wins, the other gets
/// `AlreadyExists`.
pub(crate) fn write_exclusive(
    dir: &Path,
    target_name: &str,
    bytes: &[u8],
) -> std::io::Result<()> {
    let target = dir.join(target_name);
    let temp = write_temp(dir, bytes)?;

    temp.persist_noclobber(&target).map_err(|e| e.error)?;
    sync_dir(dir)?;
    trace!(target = %target.display(), "atomic create committed");
    Ok(())
}

/// Create the temp file next to the target, fill it, and fsync it.
fn write_temp(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut temp = tempfile::Builder::new()
        .prefix(".config.")
        .suffix(".part")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Fsync the containing directory so the rename itself is durable.
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}
