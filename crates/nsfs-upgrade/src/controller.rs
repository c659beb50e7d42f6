//! The upgrade controller: `start`, `status`, `history`.
//!
//! `start` is the hard one. It gates on the whole cluster being at the
//! expected package version, flips the `phase` latch in `system.json`
//! through the atomic-rename primitive (the loser of a race observes
//! `CONFIG_DIR_LOCKED` and refuses), runs the migration scripts in semver
//! order with progress persisted after every script, and unlocks only when
//! everything ran. A failed script leaves the latch locked and the error
//! recorded for the operator; a re-run on the same host resumes past the
//! scripts that already completed.

use std::cmp::Ordering;

use chrono::Utc;
use nsfs_configfs::ConfigFs;
use nsfs_model::{
    ConfigDirPhase, ConfigDirUpgrade, ConfigDirectory, InProgressUpgrade, SystemConfig,
    UpgradeHistory,
};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{UpgradeError, UpgradeResult};
use crate::scripts::{ScriptContext, ScriptRegistry};
use crate::semver::Semver;

/// Schema version assumed for config directories that predate versioning.
const PRE_SCHEMA_VERSION: &str = "0.0.0";

/// Caller-supplied arguments to `start`.
#[derive(Debug, Clone)]
pub struct StartArgs {
    /// The package version the caller believes is deployed everywhere.
    pub expected_version: String,
    /// Every hostname the caller believes is part of the deployment.
    pub expected_hosts: Vec<String>,
    /// Operator escape hatch: bypass the cluster gates (never the latch).
    pub skip_verification: bool,
}

impl StartArgs {
    /// Split the CLI's comma-separated host list.
    #[must_use]
    pub fn parse_hosts(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Result of a successful `start`.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// Operator-facing summary.
    pub message: String,
}

/// Drives config-directory upgrades against the live `system.json`.
#[derive(Debug)]
pub struct UpgradeController {
    configfs: ConfigFs,
    registry: ScriptRegistry,
    package_version: String,
    target_config_dir_version: String,
    hostname: String,
}

impl UpgradeController {
    /// Create a controller for this host.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::Internal`] when the hostname cannot be read.
    pub fn new(
        configfs: ConfigFs,
        registry: ScriptRegistry,
        package_version: String,
        target_config_dir_version: String,
    ) -> UpgradeResult<Self> {
        let hostname = hostname::get()
            .map_err(|e| UpgradeError::Internal(anyhow::anyhow!("cannot read hostname: {e}")))?
            .to_string_lossy()
            .into_owned();
        Ok(Self::with_hostname(
            configfs,
            registry,
            package_version,
            target_config_dir_version,
            hostname,
        ))
    }

    /// Create a controller with an explicit hostname (tests, containers).
    #[must_use]
    pub fn with_hostname(
        configfs: ConfigFs,
        registry: ScriptRegistry,
        package_version: String,
        target_config_dir_version: String,
        hostname: String,
    ) -> Self {
        Self {
            configfs,
            registry,
            package_version,
            target_config_dir_version,
            hostname,
        }
    }

    /// Run the upgrade without external cancellation.
    pub async fn start(&self, args: &StartArgs) -> UpgradeResult<StartOutcome> {
        let (_tx, rx) = watch::channel(false);
        self.start_with_cancel(args, rx).await
    }

    /// Run the upgrade, checking `cancel` between scripts.
    ///
    /// On cancellation the latch stays locked and completed scripts remain
    /// recorded; a later `start` on this host resumes.
    pub async fn start_with_cancel(
        &self,
        args: &StartArgs,
        cancel: watch::Receiver<bool>,
    ) -> UpgradeResult<StartOutcome> {
        let Some(mut system) = self.configfs.read_system().await? else {
            return Err(UpgradeError::failed(
                "config dir upgrade failed - system does not exist",
            ));
        };

        if args.skip_verification {
            warn!("skipping cluster verification on operator request");
        } else {
            self.verify_cluster(&system, args)?;
        }

        let target = Semver::parse(&self.target_config_dir_version)?;
        let current_str = system
            .config_directory
            .as_ref()
            .map_or(PRE_SCHEMA_VERSION, |cd| cd.config_dir_version.as_str())
            .to_owned();
        let current = Semver::parse(&current_str)?;

        match current.cmp_warn_on_suffix(&target) {
            Ordering::Equal => {
                return Ok(StartOutcome {
                    message: format!(
                        "config_dir_version {current_str} and expected config_dir_version {} \
                         match, nothing to upgrade",
                        self.target_config_dir_version
                    ),
                });
            }
            Ordering::Greater => {
                return Err(UpgradeError::failed(format!(
                    "config dir version {current_str} is newer than this package's {} - \
                     downgrade is not supported",
                    self.target_config_dir_version
                )));
            }
            Ordering::Less => {}
        }

        let mut in_progress = self.take_latch(&mut system, args, &current_str)?;
        self.persist_in_progress(&mut system, &in_progress).await?;

        let ctx = ScriptContext {
            configfs: self.configfs.clone(),
            from_version: current_str.clone(),
            to_version: self.target_config_dir_version.clone(),
        };

        for script in self.registry.between(&current, &target) {
            if in_progress
                .completed_scripts
                .iter()
                .any(|id| id == script.id())
            {
                info!(script = script.id(), "script already completed, skipping");
                continue;
            }
            if *cancel.borrow() {
                in_progress.error = Some("upgrade canceled".to_owned());
                self.persist_in_progress(&mut system, &in_progress).await?;
                return Err(UpgradeError::failed("config dir upgrade canceled"));
            }

            info!(script = script.id(), description = script.description(), "running upgrade script");
            match script.run(&ctx).await {
                Ok(()) => {
                    in_progress.completed_scripts.push(script.id().to_owned());
                    self.persist_in_progress(&mut system, &in_progress).await?;
                }
                Err(e) => {
                    error!(script = script.id(), error = %e, "upgrade script failed");
                    in_progress.error = Some(e.to_string());
                    self.persist_in_progress(&mut system, &in_progress).await?;
                    return Err(UpgradeError::failed(format!(
                        "config dir upgrade failed on script {}: {e}",
                        script.id()
                    )));
                }
            }
        }

        self.commit(&mut system, in_progress).await?;
        Ok(StartOutcome {
            message: format!(
                "config directory upgraded from version {current_str} to {} successfully",
                self.target_config_dir_version
            ),
        })
    }

    /// The in-flight upgrade, or `None` when nothing is running.
    ///
    /// # Errors
    ///
    /// Fails when `system.json` does not exist.
    pub async fn status(&self) -> UpgradeResult<Option<InProgressUpgrade>> {
        let Some(system) = self.configfs.read_system().await? else {
            return Err(UpgradeError::failed(
                "config dir upgrade status failed - system does not exist",
            ));
        };
        Ok(system
            .config_directory
            .and_then(|cd| cd.in_progress_upgrade))
    }

    /// The config-directory upgrade history, or `None` before any upgrade.
    ///
    /// # Errors
    ///
    /// Fails when `system.json` does not exist.
    pub async fn history(&self) -> UpgradeResult<Option<UpgradeHistory<ConfigDirUpgrade>>> {
        let Some(system) = self.configfs.read_system().await? else {
            return Err(UpgradeError::failed(
                "config dir upgrade history failed - system does not exist",
            ));
        };
        Ok(system.config_directory.map(|cd| cd.upgrade_history))
    }

    // -----------------------------------------------------------------------
    // start internals
    // -----------------------------------------------------------------------

    /// All `start` pre-conditions that gate on the cluster state.
    fn verify_cluster(&self, system: &SystemConfig, args: &StartArgs) -> UpgradeResult<()> {
        let expected = Semver::parse(&args.expected_version)?;
        let running = Semver::parse(&self.package_version)?;

        for host in &args.expected_hosts {
            if !system.hosts.contains_key(host) {
                return Err(UpgradeError::failed(format!(
                    "config dir upgrade can not be started - the host {host} from \
                     expected_hosts is missing in system.json"
                )));
            }
        }
        for host in system.hosts.keys() {
            if !args.expected_hosts.iter().any(|h| h == host) {
                return Err(UpgradeError::failed(format!(
                    "config dir upgrade can not be started - expected_hosts missing the \
                     host {host} recorded in system.json"
                )));
            }
        }

        if expected.cmp_warn_on_suffix(&running) != Ordering::Equal {
            return Err(UpgradeError::failed(format!(
                "config dir upgrade can not be started - the running host's package \
                 version {} does not match the user's expected version {}",
                self.package_version, args.expected_version
            )));
        }

        for (host, record) in &system.hosts {
            let host_version = Semver::parse(&record.current_version)?;
            if host_version.cmp_warn_on_suffix(&expected) != Ordering::Equal {
                return Err(UpgradeError::failed(format!(
                    "config dir upgrade can not be started until all nodes have the \
                     expected version {} - host {host} is at {}",
                    args.expected_version, record.current_version
                )));
            }
        }

        let oldest = system
            .hosts
            .values()
            .map(|r| Semver::parse(&r.current_version))
            .collect::<UpgradeResult<Vec<_>>>()?
            .into_iter()
            .min();
        if let Some(oldest) = oldest {
            if running < oldest {
                return Err(UpgradeError::failed(format!(
                    "config dir upgrade can not be started until all nodes have the \
                     expected version {}",
                    args.expected_version
                )));
            }
        }
        Ok(())
    }

    /// Take (or resume) the `CONFIG_DIR_LOCKED` latch in memory.
    ///
    /// A latch held by another host refuses; a latch held by this host
    /// resumes, clearing the recorded error but keeping completed scripts.
    fn take_latch(
        &self,
        system: &mut SystemConfig,
        args: &StartArgs,
        current_version: &str,
    ) -> UpgradeResult<InProgressUpgrade> {
        let resumed = match system.config_directory.as_ref() {
            Some(cd) if cd.phase == ConfigDirPhase::Locked => match &cd.in_progress_upgrade {
                Some(ip) if ip.running_host == self.hostname => {
                    info!(
                        completed = ip.completed_scripts.len(),
                        "resuming in-progress upgrade on this host"
                    );
                    Some(ip.clone())
                }
                Some(ip) => {
                    return Err(UpgradeError::failed(format!(
                        "config dir upgrade can not be started - the config directory is \
                         locked by an in-progress upgrade on host {}",
                        ip.running_host
                    )));
                }
                None => {
                    return Err(UpgradeError::failed(
                        "config dir upgrade can not be started - the config directory is locked",
                    ));
                }
            },
            _ => None,
        };

        let mut in_progress = resumed.unwrap_or_else(|| InProgressUpgrade {
            start_timestamp: Utc::now().timestamp_millis(),
            running_host: self.hostname.clone(),
            package_from_version: args.expected_version.clone(),
            package_to_version: self.package_version.clone(),
            config_dir_from_version: current_version.to_owned(),
            config_dir_to_version: self.target_config_dir_version.clone(),
            completed_scripts: Vec::new(),
            error: None,
        });
        in_progress.error = None;
        Ok(in_progress)
    }

    /// Persist the lock + in-progress record through the atomic rename.
    async fn persist_in_progress(
        &self,
        system: &mut SystemConfig,
        in_progress: &InProgressUpgrade,
    ) -> UpgradeResult<()> {
        let config_directory =
            system
                .config_directory
                .get_or_insert_with(|| ConfigDirectory {
                    config_dir_version: in_progress.config_dir_from_version.clone(),
                    phase: ConfigDirPhase::Locked,
                    in_progress_upgrade: None,
                    upgrade_history: UpgradeHistory::default(),
                });
        config_directory.phase = ConfigDirPhase::Locked;
        config_directory.in_progress_upgrade = Some(in_progress.clone());
        self.configfs.write_system(system).await?;
        Ok(())
    }

    /// Move the finished upgrade into history, unlock, bump the version.
    async fn commit(
        &self,
        system: &mut SystemConfig,
        in_progress: InProgressUpgrade,
    ) -> UpgradeResult<()> {
        let completed = ConfigDirUpgrade {
            timestamp: Utc::now().timestamp_millis(),
            running_host: in_progress.running_host,
            package_from_version: in_progress.package_from_version,
            package_to_version: in_progress.package_to_version,
            config_dir_from_version: in_progress.config_dir_from_version,
            config_dir_to_version: in_progress.config_dir_to_version,
            completed_scripts: in_progress.completed_scripts,
        };

        let config_directory = system.config_directory.as_mut().ok_or_else(|| {
            UpgradeError::Internal(anyhow::anyhow!("config_directory vanished during upgrade"))
        })?;
        config_directory
            .upgrade_history
            .successful_upgrades
            .insert(0, completed);
        config_directory.in_progress_upgrade = None;
        config_directory.phase = ConfigDirPhase::Unlocked;
        config_directory.config_dir_version = self.target_config_dir_version.clone();
        self.configfs.write_system(system).await?;
        info!(
            version = %self.target_config_dir_version,
            "config directory upgrade committed"
        );
        Ok(())
    }
}
