//! Runtime configuration for the NSFS control plane.
//!
//! All configuration is injected at startup: defaults, then environment
//! variables, then CLI flags (applied by the binary). The config root and
//! the WAL directory are the only process-wide paths in the system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::ConfigRootBackend;

/// Schema version of the config directory this build writes and expects.
pub const CONFIG_DIR_VERSION: &str = "1.0.0";

/// Default config root when `NSFS_NC_DEFAULT_CONF_DIR` is unset.
const DEFAULT_CONF_DIR: &str = "/etc/noobaa.conf.d";

/// Default WAL directory when `NSFS_GLACIER_LOGS_DIR` is unset.
const DEFAULT_GLACIER_LOGS_DIR: &str = "/var/log/noobaa/wal";

/// Default TTL for the per-process account-by-id cache, in seconds.
const DEFAULT_ACCOUNT_CACHE_TTL_SECS: u64 = 60;

/// Records at or below this byte length rely on O_APPEND atomicity;
/// longer records take an advisory lock for the write. Matches POSIX
/// `PIPE_BUF`.
const DEFAULT_WAL_MAX_ATOMIC_RECORD_LEN: usize = 512;

/// Global configuration for the NSFS control plane.
///
/// # Examples
///
/// ```
/// use nsfs_core::NsfsConfig;
///
/// let config = NsfsConfig::default();
/// assert_eq!(config.config_root.to_str(), Some("/etc/noobaa.conf.d"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct NsfsConfig {
    /// Root directory holding all persistent control-plane state.
    #[builder(default = PathBuf::from(DEFAULT_CONF_DIR))]
    pub config_root: PathBuf,

    /// Backend flavor of the config root filesystem.
    #[builder(default)]
    pub config_root_backend: ConfigRootBackend,

    /// Directory holding the glacier migrate / restore WALs.
    #[builder(default = PathBuf::from(DEFAULT_GLACIER_LOGS_DIR))]
    pub glacier_logs_dir: PathBuf,

    /// Package version of the running host.
    #[builder(default = String::from(env!("CARGO_PKG_VERSION")))]
    pub package_version: String,

    /// Directory of operator-supplied upgrade scripts, if any.
    #[builder(default)]
    pub upgrade_scripts_dir: Option<PathBuf>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// TTL in seconds for the account-by-id cache.
    #[builder(default = DEFAULT_ACCOUNT_CACHE_TTL_SECS)]
    pub account_cache_ttl_secs: u64,

    /// Largest WAL record written without an advisory lock.
    #[builder(default = DEFAULT_WAL_MAX_ATOMIC_RECORD_LEN)]
    pub wal_max_atomic_record_len: usize,

    /// Seed key generation deterministically (test-only).
    #[builder(default = false)]
    pub disable_init_random_seed: bool,
}

impl Default for NsfsConfig {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from(DEFAULT_CONF_DIR),
            config_root_backend: ConfigRootBackend::default(),
            glacier_logs_dir: PathBuf::from(DEFAULT_GLACIER_LOGS_DIR),
            package_version: String::from(env!("CARGO_PKG_VERSION")),
            upgrade_scripts_dir: None,
            log_level: String::from("info"),
            account_cache_ttl_secs: DEFAULT_ACCOUNT_CACHE_TTL_SECS,
            wal_max_atomic_record_len: DEFAULT_WAL_MAX_ATOMIC_RECORD_LEN,
            disable_init_random_seed: false,
        }
    }
}

impl NsfsConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `NSFS_NC_DEFAULT_CONF_DIR` | `/etc/noobaa.conf.d` |
    /// | `CONFIG_ROOT_BACKEND` | `none` |
    /// | `NSFS_GLACIER_LOGS_DIR` | `/var/log/noobaa/wal` |
    /// | `NSFS_UPGRADE_SCRIPTS_DIR` | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    /// | `DISABLE_INIT_RANDOM_SEED` | `false` |
    ///
    /// # Errors
    ///
    /// Returns [`crate::NsfsError::Config`] if `CONFIG_ROOT_BACKEND` has an
    /// unrecognized value.
    pub fn from_env() -> crate::NsfsResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("NSFS_NC_DEFAULT_CONF_DIR") {
            config.config_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CONFIG_ROOT_BACKEND") {
            config.config_root_backend = ConfigRootBackend::parse(&v)?;
        }
        if let Ok(v) = std::env::var("NSFS_GLACIER_LOGS_DIR") {
            config.glacier_logs_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("NSFS_UPGRADE_SCRIPTS_DIR") {
            config.upgrade_scripts_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("DISABLE_INIT_RANDOM_SEED") {
            config.disable_init_random_seed = v == "1" || v.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }
}
