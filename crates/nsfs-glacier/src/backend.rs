//! The tape-stack boundary.

use std::path::{Path, PathBuf};

use nsfs_core::FsContext;

use crate::error::GlacierResult;

/// Interface to the vendor tape stack.
///
/// Implementations receive whole sealed segments (not individual records)
/// so they can batch work into a single tape-tool invocation. They must be
/// idempotent per object: a segment may be replayed after a crash.
#[async_trait::async_trait]
pub trait GlacierBackend: Send + Sync {
    /// Whether the object still needs migration. The pre-check that turns
    /// an at-least-once replay into a no-op.
    async fn should_migrate(&self, ctx: &FsContext, path: &Path) -> GlacierResult<bool>;

    /// Migrate every object listed in the sealed segment.
    ///
    /// Returns the subset of entries that failed; the caller retains the
    /// segment for a future pass when the subset is non-empty.
    async fn migrate(&self, ctx: &FsContext, segment: &Path) -> GlacierResult<Vec<PathBuf>>;

    /// Restore every object listed in the sealed segment.
    ///
    /// On success the backend clears the ongoing marker on each object and
    /// stamps its expiry. Returns `false` when the segment must be retained.
    async fn restore(&self, ctx: &FsContext, segment: &Path) -> GlacierResult<bool>;

    /// Drop the restored copy of one object whose expiry has passed.
    /// Idempotent.
    async fn process_expired(&self, ctx: &FsContext, path: &Path) -> GlacierResult<()>;
}
