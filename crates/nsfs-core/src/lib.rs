//! Core types, configuration, and error handling for the NSFS control plane.
//!
//! This crate provides the foundational building blocks shared across all
//! NSFS control-plane crates: the injected runtime configuration (config
//! root, WAL directory, versions), the filesystem execution context, and
//! the common error type.

mod config;
mod error;
mod types;

pub use config::{CONFIG_DIR_VERSION, NsfsConfig};
pub use error::{NsfsError, NsfsResult};
pub use types::{ConfigRootBackend, FsContext, FsIdentity};
