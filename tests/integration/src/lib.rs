//! Integration tests for the NSFS control plane.
//!
//! These tests drive the whole stack through [`nsfs_manage::ManageApi`]
//! (the same surface the CLI uses) against a temporary config root, plus
//! the glacier WAL workflows against a temporary logs directory. No
//! external services are required.

mod test_account;
mod test_bucket;
mod test_upgrade;
mod test_wal;

use std::sync::Once;

use nsfs_core::NsfsConfig;
use nsfs_manage::ManageApi;
use nsfs_model::{ConfigDirPhase, ConfigDirectory, HostRecord, SystemConfig, UpgradeHistory};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Package version every fixture host runs.
pub const PKG_VERSION: &str = "5.18.0";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// One test's world: a temp directory and an API rooted inside it.
#[derive(Debug)]
pub struct TestEnv {
    /// Keeps the temp tree alive for the test's duration.
    pub dir: TempDir,
    /// The management API over `<dir>/conf`.
    pub api: ManageApi,
}

/// Build a fresh environment.
#[must_use]
pub fn make_env() -> TestEnv {
    init_tracing();
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let config = NsfsConfig::builder()
        .config_root(dir.path().join("conf"))
        .glacier_logs_dir(dir.path().join("wal"))
        .package_version(PKG_VERSION.to_owned())
        .build();
    let api = ManageApi::new(config);
    TestEnv { dir, api }
}

/// Uid of the test process, used as account identity in fixtures.
#[must_use]
pub fn own_uid() -> u32 {
    nix::unistd::geteuid().as_raw()
}

/// Gid of the test process.
#[must_use]
pub fn own_gid() -> u32 {
    nix::unistd::getegid().as_raw()
}

/// The hostname the upgrade controller will see.
#[must_use]
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|e| panic!("hostname: {e}"))
}

/// Options for an account whose identity is the test process itself.
#[must_use]
pub fn account_options(env: &TestEnv, name: &str) -> Value {
    json!({
        "name": name,
        "uid": own_uid(),
        "gid": own_gid(),
        "new_buckets_path": env.dir.path().to_str(),
    })
}

/// Seed `system.json` with the given hosts and optional config-dir version.
pub async fn seed_system(env: &TestEnv, hosts: &[(&str, &str)], config_dir_version: Option<&str>) {
    env.api
        .configfs()
        .ensure_layout()
        .await
        .unwrap_or_else(|e| panic!("layout: {e}"));

    let mut system = SystemConfig::default();
    for (host, version) in hosts {
        system.hosts.insert(
            (*host).to_owned(),
            HostRecord {
                current_version: (*version).to_owned(),
                upgrade_history: UpgradeHistory::default(),
            },
        );
    }
    if let Some(version) = config_dir_version {
        system.config_directory = Some(ConfigDirectory {
            config_dir_version: version.to_owned(),
            phase: ConfigDirPhase::Unlocked,
            in_progress_upgrade: None,
            upgrade_history: UpgradeHistory::default(),
        });
    }
    env.api
        .configfs()
        .write_system(&system)
        .await
        .unwrap_or_else(|e| panic!("seed system: {e}"));
}
