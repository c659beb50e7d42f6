//! Glacier (tape) tiering workflows over the write-ahead log.
//!
//! Two WALs exist side by side in the glacier logs directory: the *migrate*
//! WAL records objects newly written with the GLACIER storage class, the
//! *restore* WAL records restore-object requests. Periodic jobs seal the
//! active segments and drain them through a [`GlacierBackend`], the only
//! part of the pipeline that talks to the actual tape stack.
//!
//! Every workflow is at-least-once: a crash between processing and segment
//! deletion replays the segment, and the backend's `should_migrate`
//! pre-check turns the replay into a no-op.

mod backend;
mod error;
mod status;
mod workflows;

pub use backend::GlacierBackend;
pub use error::{GlacierError, GlacierResult};
pub use status::{
    RestoreStatus, clear_restore_request, get_restore_request, get_restore_status,
    set_restore_request, set_restore_status,
};
pub use workflows::Glacier;
