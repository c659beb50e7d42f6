//! Append-only write-ahead log with active / inactive segment rotation.
//!
//! A [`WalFile`] owns a directory of newline-framed log segments. Exactly
//! one segment is *active* (the current append target); sealed segments are
//! *inactive* until a processor takes each one under an exclusive advisory
//! lock, drains it, and signals whether it may be deleted.
//!
//! Concurrency model:
//!
//! - appends within a process are serialized by an async mutex;
//! - appends across processes rely on `O_APPEND` with records bounded
//!   below `PIPE_BUF`, falling back to a whole-file advisory lock for
//!   oversized records;
//! - segment processing uses non-blocking `flock(2)`: a contended segment
//!   is skipped, never waited on.

mod error;
mod reader;
mod wal;

pub use error::{WalError, WalResult};
pub use reader::read_records;
pub use wal::WalFile;
