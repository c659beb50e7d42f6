//! Cluster-gated, phased, resumable upgrades of the config directory.
//!
//! `start` refuses until every host recorded in `system.json` runs the
//! expected package version; only then does it take the config-directory
//! latch (`CONFIG_DIR_LOCKED`, written through the atomic-rename
//! primitive), run the migration scripts between the current and target
//! schema versions in ascending semver order, and unlock. Progress is
//! persisted after every script, so a crashed upgrade resumes where it
//! stopped; a failed script leaves the directory locked with the error
//! recorded for the operator.

mod controller;
mod error;
mod scripts;
mod semver;

pub use controller::{StartArgs, StartOutcome, UpgradeController};
pub use error::{UpgradeError, UpgradeResult};
pub use scripts::{ScriptContext, ScriptRegistry, UpgradeScript};
pub use semver::Semver;
