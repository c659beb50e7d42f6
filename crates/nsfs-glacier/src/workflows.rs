//! The migrate / restore / expiry drivers.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use nsfs_core::FsContext;
use nsfs_wal::WalFile;
use tracing::{debug, info, warn};

use crate::backend::GlacierBackend;
use crate::error::{GlacierError, GlacierResult};
use crate::status::{self, RestoreStatus};

/// Segment name prefix of the migrate WAL.
const MIGRATE_PREFIX: &str = "migrate";

/// Segment name prefix of the restore WAL.
const RESTORE_PREFIX: &str = "restore";

/// The pair of glacier WALs and the workflows over them.
#[derive(Debug)]
pub struct Glacier {
    ctx: FsContext,
    migrate_wal: WalFile,
    restore_wal: WalFile,
}

impl Glacier {
    /// Open both WALs under `logs_dir`.
    pub async fn open(
        logs_dir: &Path,
        ctx: FsContext,
        max_atomic_record_len: usize,
    ) -> GlacierResult<Self> {
        let migrate_wal = WalFile::open(logs_dir, MIGRATE_PREFIX, max_atomic_record_len).await?;
        let restore_wal = WalFile::open(logs_dir, RESTORE_PREFIX, max_atomic_record_len).await?;
        Ok(Self {
            ctx,
            migrate_wal,
            restore_wal,
        })
    }

    /// The migrate WAL.
    #[must_use]
    pub fn migrate_wal(&self) -> &WalFile {
        &self.migrate_wal
    }

    /// The restore WAL.
    #[must_use]
    pub fn restore_wal(&self) -> &WalFile {
        &self.restore_wal
    }

    /// Record a GLACIER-class object for migration.
    ///
    /// Called on upload, before the put is acknowledged: the WAL entry is
    /// the durable intent the periodic job works from.
    pub async fn record_migrate(&self, object_path: &Path) -> GlacierResult<()> {
        self.migrate_wal
            .append(&path_record(object_path)?)
            .await
            .map_err(GlacierError::from)
    }

    /// Queue a restore request for `days` and mark the object ongoing.
    pub async fn restore_object(&self, object_path: &Path, days: u32) -> GlacierResult<()> {
        status::set_restore_request(object_path, days).await?;
        status::set_restore_status(object_path, &RestoreStatus::ongoing()).await?;
        self.restore_wal.append(&path_record(object_path)?).await?;
        debug!(object = %object_path.display(), days, "queued restore request");
        Ok(())
    }

    /// Seal the migrate WAL and drain its inactive segments.
    ///
    /// A segment is deleted only when the backend migrated every entry;
    /// any failed subset keeps the segment for a future pass.
    pub async fn run_migrations<B: GlacierBackend>(&self, backend: &B) -> GlacierResult<usize> {
        self.migrate_wal.swap().await?;
        let ctx = &self.ctx;
        let deleted = self
            .migrate_wal
            .process_inactive(|segment| async move {
                let failed = backend
                    .migrate(ctx, &segment)
                    .await
                    .map_err(into_wal_error)?;
                if failed.is_empty() {
                    Ok(true)
                } else {
                    warn!(
                        segment = %segment.display(),
                        failed = failed.len(),
                        "migration left failed entries, retaining segment"
                    );
                    Ok(false)
                }
            })
            .await?;
        info!(deleted, "migrate WAL pass complete");
        Ok(deleted)
    }

    /// Seal the restore WAL and drain its inactive segments.
    pub async fn run_restores<B: GlacierBackend>(&self, backend: &B) -> GlacierResult<usize> {
        self.restore_wal.swap().await?;
        let ctx = &self.ctx;
        let deleted = self
            .restore_wal
            .process_inactive(|segment| async move {
                backend.restore(ctx, &segment).await.map_err(into_wal_error)
            })
            .await?;
        info!(deleted, "restore WAL pass complete");
        Ok(deleted)
    }

    /// Sweep `root` for restored objects past their expiry and hand each to
    /// the backend. Idempotent: objects already processed no longer carry
    /// an expired status.
    pub async fn run_expiry<B: GlacierBackend>(
        &self,
        backend: &B,
        root: &Path,
    ) -> GlacierResult<usize> {
        let now = Utc::now();
        let mut expired = 0;
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(GlacierError::io(&dir, e)),
            };
            loop {
                let entry = entries
                    .next_entry()
                    .await
                    .map_err(|e| GlacierError::io(&dir, e))?;
                let Some(entry) = entry else { break };
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| GlacierError::io(&path, e))?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let Some(restore_status) = status::get_restore_status(&path).await? else {
                    continue;
                };
                if restore_status.is_expired_at(now) {
                    backend.process_expired(&self.ctx, &path).await?;
                    expired += 1;
                }
            }
        }

        info!(expired, root = %root.display(), "expiry sweep complete");
        Ok(expired)
    }

    /// Expiry stamp for a restore of `days` completed now.
    #[must_use]
    pub fn expiry_for_days(days: u32) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(i64::from(days))
    }
}

/// Render an object path as one WAL record.
fn path_record(path: &Path) -> GlacierResult<String> {
    path.to_str().map(str::to_owned).ok_or_else(|| {
        GlacierError::Internal(anyhow::anyhow!(
            "object path is not valid UTF-8: {}",
            path.display()
        ))
    })
}

/// Backend failures cross the WAL handler boundary as internal errors; the
/// WAL logs them and retains the segment.
fn into_wal_error(e: GlacierError) -> nsfs_wal::WalError {
    nsfs_wal::WalError::Internal(anyhow::anyhow!(e))
}
