//! User-database resolution and identity-scoped filesystem probes.
//!
//! Accounts carry their filesystem identity either as a uid/gid pair or as
//! a distinguished name (a system user resolved through the host's user
//! database). Validation needs to answer one question: can *that* identity
//! read and write the account's `new_buckets_path`?
//!
//! The probe never mutates process-wide credentials. `setfsuid(2)` /
//! `setfsgid(2)` are per-thread on Linux, so the probe borrows a blocking
//! thread, flips that thread's filesystem identity behind a scope guard,
//! and restores it on every exit path, including panics.

mod error;
mod probe;
mod resolve;

pub use error::{IdentityError, IdentityResult};
pub use probe::probe_access;
pub use resolve::{resolve_distinguished_name, resolve_identity};
