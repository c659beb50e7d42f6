//! The WAL file: active-segment appends, rotation, and processor handoff.

use std::future::Future;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{WalError, WalResult};

/// Extension of every WAL segment.
const SEGMENT_SUFFIX: &str = ".log";

/// Name component marking the single active segment.
const ACTIVE_MARKER: &str = "active";

/// A write-ahead log rooted in one directory.
///
/// Segment naming: the active segment is `<prefix>.active.log`; sealed
/// segments are `<prefix>.<generation>.log` with a zero-padded,
/// monotonically increasing generation, so lexical order equals age.
#[derive(Debug)]
pub struct WalFile {
    dir: PathBuf,
    prefix: String,
    max_atomic_record_len: usize,
    // Serializes appends and swaps within this process.
    append_lock: Mutex<()>,
}

impl WalFile {
    /// Open (and create if needed) a WAL under `dir` with the given
    /// segment name prefix.
    ///
    /// `max_atomic_record_len` bounds the framed record size written under
    /// plain `O_APPEND`; longer records take a whole-file advisory lock.
    pub async fn open(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        max_atomic_record_len: usize,
    ) -> WalResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| WalError::io(&dir, e))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            max_atomic_record_len,
            append_lock: Mutex::new(()),
        })
    }

    /// Path of the active segment (which may not exist yet).
    #[must_use]
    pub fn active_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{ACTIVE_MARKER}{SEGMENT_SUFFIX}", self.prefix))
    }

    /// Append one record to the active segment.
    ///
    /// The record is newline-terminated on disk; the payload itself must be
    /// non-empty and newline-free.
    ///
    /// # Errors
    ///
    /// [`WalError::InvalidRecord`] for payloads that would break framing;
    /// [`WalError::Io`] on write failures.
    pub async fn append(&self, record: &str) -> WalResult<()> {
        if record.is_empty() {
            return Err(WalError::InvalidRecord {
                reason: "empty record".to_owned(),
            });
        }
        if record.contains('\n') {
            return Err(WalError::InvalidRecord {
                reason: "embedded newline".to_owned(),
            });
        }

        let _guard = self.append_lock.lock().await;
        let active = self.active_path();
        let mut line = record.as_bytes().to_vec();
        line.push(b'\n');

        if line.len() <= self.max_atomic_record_len {
            // O_APPEND writes at or below PIPE_BUF do not interleave with
            // concurrent writers from other processes.
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&active)
                .await
                .map_err(|e| WalError::io(&active, e))?;
            file.write_all(&line)
                .await
                .map_err(|e| WalError::io(&active, e))?;
            file.sync_data()
                .await
                .map_err(|e| WalError::io(&active, e))?;
        } else {
            self.append_locked(active, line).await?;
        }
        Ok(())
    }

    /// Oversized-record path: hold the whole-file advisory lock for the
    /// write so cross-process framing survives records above `PIPE_BUF`.
    async fn append_locked(&self, active: PathBuf, line: Vec<u8>) -> WalResult<()> {
        tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&active)
                .map_err(|e| WalError::io(&active, e))?;
            let guard = Flock::lock(file, FlockArg::LockExclusive)
                .map_err(|(_, errno)| WalError::io(&active, std::io::Error::from(errno)))?;

            use std::io::Write;
            let mut writer: &std::fs::File = &guard;
            writer
                .write_all(&line)
                .and_then(|()| writer.sync_data())
                .map_err(|e| WalError::io(&active, e))
            // Lock released when `guard` drops, on success and failure alike.
        })
        .await
        .map_err(|e| WalError::Internal(anyhow::anyhow!("append task failed: {e}")))?
    }

    /// Seal the active segment: rename it to the next inactive generation.
    ///
    /// Returns the sealed segment's path, or `None` when there was nothing
    /// to seal. A zero-size active file is left untouched so empty inactive
    /// segments can never exist.
    pub async fn swap(&self) -> WalResult<Option<PathBuf>> {
        let _guard = self.append_lock.lock().await;
        let active = self.active_path();

        let metadata = match tokio::fs::metadata(&active).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WalError::io(&active, e)),
        };
        if metadata.len() == 0 {
            debug!(wal = %self.prefix, "active segment empty, skipping swap");
            return Ok(None);
        }

        let generation = self.next_generation().await?;
        let sealed = self.segment_path(generation);
        tokio::fs::rename(&active, &sealed)
            .await
            .map_err(|e| WalError::io(&active, e))?;
        info!(wal = %self.prefix, segment = %sealed.display(), "sealed active segment");
        Ok(Some(sealed))
    }

    /// Drain inactive segments through `handler`, oldest first.
    ///
    /// Each segment is taken under a non-blocking exclusive advisory lock;
    /// contended segments are skipped for a future pass. The handler
    /// returns `true` when the segment was fully processed and may be
    /// deleted, `false` to retain it. Handler failures are logged, the
    /// segment retained, and processing continues.
    ///
    /// Returns the number of segments deleted.
    pub async fn process_inactive<F, Fut>(&self, mut handler: F) -> WalResult<usize>
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = WalResult<bool>>,
    {
        let mut deleted = 0;
        for (_, path) in self.inactive_segments().await? {
            let lock = {
                let path = path.clone();
                tokio::task::spawn_blocking(move || try_lock_exclusive(&path))
                    .await
                    .map_err(|e| WalError::Internal(anyhow::anyhow!("lock task failed: {e}")))??
            };
            let Some(lock) = lock else {
                debug!(segment = %path.display(), "segment busy or gone, skipping");
                continue;
            };

            match handler(path.clone()).await {
                Ok(true) => {
                    tokio::fs::remove_file(&path)
                        .await
                        .map_err(|e| WalError::io(&path, e))?;
                    debug!(segment = %path.display(), "segment processed and deleted");
                    deleted += 1;
                }
                Ok(false) => {
                    debug!(segment = %path.display(), "segment retained by handler");
                }
                Err(e) => {
                    warn!(segment = %path.display(), error = %e, "segment handler failed, retaining");
                }
            }
            drop(lock);
        }
        Ok(deleted)
    }

    /// Sealed segments of this WAL, ascending by generation.
    pub async fn inactive_segments(&self) -> WalResult<Vec<(u64, PathBuf)>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WalError::io(&self.dir, e)),
        };

        let mut segments = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| WalError::io(&self.dir, e))?;
            let Some(entry) = entry else { break };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(generation) = self.parse_generation(name) {
                segments.push((generation, entry.path()));
            }
        }
        segments.sort_unstable_by_key(|(generation, _)| *generation);
        Ok(segments)
    }

    fn segment_path(&self, generation: u64) -> PathBuf {
        self.dir
            .join(format!("{}.{generation:016}{SEGMENT_SUFFIX}", self.prefix))
    }

    /// Parse `<prefix>.<generation>.log`, ignoring the active segment and
    /// foreign files.
    fn parse_generation(&self, name: &str) -> Option<u64> {
        let rest = name.strip_prefix(self.prefix.as_str())?.strip_prefix('.')?;
        let digits = rest.strip_suffix(SEGMENT_SUFFIX)?;
        if digits == ACTIVE_MARKER {
            return None;
        }
        digits.parse().ok()
    }

    async fn next_generation(&self) -> WalResult<u64> {
        Ok(self
            .inactive_segments()
            .await?
            .last()
            .map_or(1, |(generation, _)| generation + 1))
    }
}

/// Try to take a non-blocking exclusive flock on `path`.
///
/// `None` means the segment is contended by another processor or vanished
/// between listing and locking; both mean "skip".
fn try_lock_exclusive(path: &Path) -> WalResult<Option<Flock<std::fs::File>>> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WalError::io(path, e)),
    };
    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => Ok(Some(lock)),
        Err((_, Errno::EWOULDBLOCK)) => Ok(None),
        Err((_, errno)) => Err(WalError::io(path, std::io::Error::from(errno))),
    }
}
