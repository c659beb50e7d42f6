//! Config-directory upgrade integration tests, driven through the API.

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use nsfs_core::CONFIG_DIR_VERSION;
    use serde_json::json;

    use crate::{PKG_VERSION, account_options, local_hostname, make_env, seed_system};

    fn start_options(hosts: &str) -> serde_json::Value {
        json!({"expected_version": PKG_VERSION, "expected_hosts": hosts})
    }

    #[tokio::test]
    async fn test_should_refuse_start_on_lagging_host() {
        let env = make_env();
        let host = local_hostname();
        seed_system(&env, &[(host.as_str(), PKG_VERSION), ("h2", "5.17.0")], None).await;

        let err = env
            .api
            .handle(
                "upgrade",
                "start",
                start_options(&format!("{host},h2")),
            )
            .await;
        let Err(err) = err else {
            panic!("expected UpgradeFailed");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::UpgradeFailed);
        assert!(
            err.cause
                .as_deref()
                .is_some_and(|c| c.contains("until all nodes have the expected version")),
            "cause: {:?}",
            err.cause
        );
    }

    #[tokio::test]
    async fn test_should_be_noop_at_target_version() {
        let env = make_env();
        let host = local_hostname();
        seed_system(
            &env,
            &[(host.as_str(), PKG_VERSION)],
            Some(CONFIG_DIR_VERSION),
        )
        .await;

        let response = env
            .api
            .handle("upgrade", "start", start_options(&host))
            .await
            .unwrap_or_else(|e| panic!("start: {e}"));
        assert!(
            response.reply["message"]
                .as_str()
                .unwrap_or_default()
                .contains("nothing to upgrade"),
            "reply: {}",
            response.reply
        );
    }

    #[tokio::test]
    async fn test_should_upgrade_fresh_directory_and_record_history() {
        let env = make_env();
        let host = local_hostname();
        seed_system(&env, &[(host.as_str(), PKG_VERSION)], Some("0.0.0")).await;

        let response = env
            .api
            .handle("upgrade", "start", start_options(&host))
            .await
            .unwrap_or_else(|e| panic!("start: {e}"));
        assert!(
            response.reply["message"]
                .as_str()
                .unwrap_or_default()
                .contains("successfully")
        );

        // The system record reflects the committed upgrade.
        let system = env
            .api
            .configfs()
            .read_system()
            .await
            .unwrap_or_else(|e| panic!("read: {e}"))
            .unwrap_or_else(|| panic!("system missing"));
        let cd = system
            .config_directory
            .unwrap_or_else(|| panic!("config_directory missing"));
        assert_eq!(cd.config_dir_version, CONFIG_DIR_VERSION);
        assert!(cd.in_progress_upgrade.is_none());

        let entry = cd
            .upgrade_history
            .successful_upgrades
            .first()
            .unwrap_or_else(|| panic!("history empty"));
        assert_eq!(entry.running_host, host);
        assert_eq!(entry.config_dir_from_version, "0.0.0");
        assert_eq!(entry.config_dir_to_version, CONFIG_DIR_VERSION);
        // The built-in 1.0.0 migration ran.
        assert!(
            entry
                .completed_scripts
                .iter()
                .any(|s| s.contains("backfill_access_key_index")),
            "scripts: {:?}",
            entry.completed_scripts
        );

        // History through the API agrees.
        let history = env
            .api
            .handle("upgrade", "history", json!({}))
            .await
            .unwrap_or_else(|e| panic!("history: {e}"));
        assert_eq!(
            history.reply["successful_upgrades"][0]["config_dir_to_version"],
            CONFIG_DIR_VERSION
        );
    }

    #[tokio::test]
    async fn test_should_report_empty_status_when_idle() {
        let env = make_env();
        let host = local_hostname();
        seed_system(&env, &[(host.as_str(), PKG_VERSION)], None).await;

        let status = env
            .api
            .handle("upgrade", "status", json!({}))
            .await
            .unwrap_or_else(|e| panic!("status: {e}"));
        assert!(
            status.reply["message"]
                .as_str()
                .unwrap_or_default()
                .contains("no in-progress"),
            "reply: {}",
            status.reply
        );
    }

    #[tokio::test]
    async fn test_should_lock_on_failed_custom_script_and_gate_mutations() {
        let env = make_env();
        let host = local_hostname();
        seed_system(&env, &[(host.as_str(), PKG_VERSION)], Some("0.0.0")).await;

        // A custom script for the 1.0.0 bucket that always fails.
        let scripts_dir = env.dir.path().join("scripts");
        let version_dir = scripts_dir.join("1.0.0");
        std::fs::create_dir_all(&version_dir).unwrap_or_else(|e| panic!("mkdir: {e}"));
        let script = version_dir.join("00_fail");
        std::fs::write(&script, b"#!/bin/sh\necho migration exploded >&2\nexit 1\n")
            .unwrap_or_else(|e| panic!("write: {e}"));
        let mut perms = std::fs::metadata(&script)
            .unwrap_or_else(|e| panic!("stat: {e}"))
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap_or_else(|e| panic!("chmod: {e}"));

        let mut options = start_options(&host);
        options["custom_upgrade_scripts_dir"] = json!(scripts_dir.to_str());
        let err = env.api.handle("upgrade", "start", options).await;
        let Err(err) = err else {
            panic!("expected UpgradeFailed");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::UpgradeFailed);

        // The latch stays locked with the error recorded...
        let status = env
            .api
            .handle("upgrade", "status", json!({}))
            .await
            .unwrap_or_else(|e| panic!("status: {e}"));
        assert!(
            status.reply["error"]
                .as_str()
                .unwrap_or_default()
                .contains("migration exploded"),
            "status: {}",
            status.reply
        );

        // ...and resource mutations refuse while it is held.
        let err = env
            .api
            .handle("account", "add", account_options(&env, "a1"))
            .await;
        let Err(err) = err else {
            panic!("expected AccessDenied");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::AccessDenied);
    }
}
