//! The `system.json` record: per-host versions and the config-directory
//! upgrade state.
//!
//! The hostname map is flattened at the top level of the JSON object, next
//! to the optional `config_directory` key, matching live deployments:
//!
//! ```json
//! {
//!   "host-a": { "current_version": "5.18.0", "upgrade_history": { "successful_upgrades": [] } },
//!   "config_directory": { "config_dir_version": "1.0.0", "phase": "CONFIG_DIR_UNLOCKED", ... }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Phase latch of the config-directory schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigDirPhase {
    /// An upgrade holds the directory; other writers must refuse.
    #[serde(rename = "CONFIG_DIR_LOCKED")]
    Locked,
    /// Steady state.
    #[serde(rename = "CONFIG_DIR_UNLOCKED")]
    Unlocked,
}

/// One completed package upgrade on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUpgrade {
    /// Completion time, epoch milliseconds.
    pub timestamp: i64,
    /// Package version before the upgrade.
    pub from_version: String,
    /// Package version after the upgrade.
    pub to_version: String,
}

/// Upgrade history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeHistory<T> {
    /// Completed upgrades, most recent at the front.
    pub successful_upgrades: Vec<T>,
}

// Manual impl: the derived Default would bound `T: Default` even though an
// empty Vec needs no such thing.
impl<T> Default for UpgradeHistory<T> {
    fn default() -> Self {
        Self {
            successful_upgrades: Vec::new(),
        }
    }
}

/// Per-host record inside `system.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Package version currently deployed on the host.
    pub current_version: String,
    /// The host's package upgrade history.
    #[serde(default)]
    pub upgrade_history: UpgradeHistory<PackageUpgrade>,
}

/// The in-flight config-directory upgrade, owned by exactly one host.
///
/// Package and config-dir from/to versions are both recorded, denormalized,
/// and preserved verbatim in the history entry on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InProgressUpgrade {
    /// When the upgrade started, epoch milliseconds.
    pub start_timestamp: i64,
    /// Hostname of the host driving the upgrade.
    pub running_host: String,
    /// Package version the cluster was verified at.
    pub package_from_version: String,
    /// Package version of the running host.
    pub package_to_version: String,
    /// Config-dir schema version before the upgrade.
    pub config_dir_from_version: String,
    /// Config-dir schema version being upgraded to.
    pub config_dir_to_version: String,
    /// Identifiers of scripts that already ran, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_scripts: Vec<String>,
    /// Failure detail when a script aborted the upgrade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One completed config-directory upgrade in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDirUpgrade {
    /// Completion time, epoch milliseconds.
    pub timestamp: i64,
    /// Hostname of the host that drove the upgrade.
    pub running_host: String,
    /// Package version the cluster was verified at.
    pub package_from_version: String,
    /// Package version of the driving host.
    pub package_to_version: String,
    /// Config-dir schema version before the upgrade.
    pub config_dir_from_version: String,
    /// Config-dir schema version after the upgrade.
    pub config_dir_to_version: String,
    /// Identifiers of the scripts that ran, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_scripts: Vec<String>,
}

/// The `config_directory` block of `system.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDirectory {
    /// Schema version of the config directory contents.
    pub config_dir_version: String,
    /// The upgrade phase latch.
    pub phase: ConfigDirPhase,
    /// The in-flight upgrade, if one holds the latch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_progress_upgrade: Option<InProgressUpgrade>,
    /// Completed config-dir upgrades, newest first.
    #[serde(default)]
    pub upgrade_history: UpgradeHistory<ConfigDirUpgrade>,
}

/// The whole of `system.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Config-directory schema state, absent on pre-schema deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_directory: Option<ConfigDirectory>,
    /// Per-host records, keyed by hostname, flattened into the top level.
    #[serde(flatten)]
    pub hosts: BTreeMap<String, HostRecord>,
}

impl SystemConfig {
    /// The set of hostnames recorded in the system.
    #[must_use]
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.keys().map(String::as_str).collect()
    }

    /// Whether the config directory is currently latched by an upgrade.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.config_directory
            .as_ref()
            .is_some_and(|cd| cd.phase == ConfigDirPhase::Locked)
    }
}
