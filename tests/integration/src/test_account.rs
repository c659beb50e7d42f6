//! Account lifecycle integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{account_options, make_env, own_uid};

    #[tokio::test]
    async fn test_should_create_account_with_generated_keys_and_index() {
        let env = make_env();

        let response = env
            .api
            .handle("account", "add", account_options(&env, "a1"))
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));

        let access_key = response.reply["access_keys"][0]["access_key"]
            .as_str()
            .unwrap_or_default()
            .to_owned();
        let secret_key = response.reply["access_keys"][0]["secret_key"]
            .as_str()
            .unwrap_or_default()
            .to_owned();
        assert_eq!(access_key.len(), 20);
        assert!(access_key.chars().all(char::is_alphanumeric));
        assert_eq!(secret_key.len(), 40);

        // accounts/a1.json exists and the symlink resolves to it.
        let record = env.api.configfs().accounts_dir().join("a1.json");
        assert!(record.is_file());
        let link = env
            .api
            .configfs()
            .access_keys_dir()
            .join(format!("{access_key}.symlink"));
        let target = std::fs::read_link(&link).unwrap_or_else(|e| panic!("readlink: {e}"));
        assert_eq!(
            target,
            std::path::PathBuf::from("../accounts/a1.json")
        );
        let resolved = env
            .api
            .configfs()
            .get_account_by_access_key(&access_key)
            .await
            .unwrap_or_else(|e| panic!("resolve: {e}"));
        assert!(resolved.has_access_key(&access_key));
    }

    #[tokio::test]
    async fn test_should_regenerate_keys_and_move_index() {
        let env = make_env();
        let response = env
            .api
            .handle("account", "add", account_options(&env, "a1"))
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));
        let old_key = response.reply["access_keys"][0]["access_key"]
            .as_str()
            .unwrap_or_default()
            .to_owned();

        let response = env
            .api
            .handle("account", "update", json!({"name": "a1", "regenerate": true}))
            .await
            .unwrap_or_else(|e| panic!("update: {e}"));
        let new_key = response.reply["access_keys"][0]["access_key"]
            .as_str()
            .unwrap_or_default()
            .to_owned();
        assert_ne!(old_key, new_key);

        // The index follows the rotation.
        assert!(
            env.api
                .configfs()
                .get_account_by_access_key(&old_key)
                .await
                .is_err()
        );
        assert!(
            env.api
                .configfs()
                .get_account_by_access_key(&new_key)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_should_fetch_status_by_access_key_with_masked_secret() {
        let env = make_env();
        let response = env
            .api
            .handle("account", "add", account_options(&env, "a1"))
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));
        let access_key = response.reply["access_keys"][0]["access_key"]
            .as_str()
            .unwrap_or_default()
            .to_owned();

        let status = env
            .api
            .handle("account", "status", json!({"access_key": access_key}))
            .await
            .unwrap_or_else(|e| panic!("status: {e}"));
        assert_eq!(status.reply["name"], "a1");
        assert_eq!(status.reply["access_keys"][0]["secret_key"], "****");

        let status = env
            .api
            .handle(
                "account",
                "status",
                json!({"name": "a1", "show_secrets": true}),
            )
            .await
            .unwrap_or_else(|e| panic!("status: {e}"));
        assert_ne!(status.reply["access_keys"][0]["secret_key"], "****");
    }

    #[tokio::test]
    async fn test_should_keep_account_json_keys_bit_compatible() {
        let env = make_env();
        env.api
            .handle("account", "add", account_options(&env, "a1"))
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));

        let raw = std::fs::read_to_string(env.api.configfs().accounts_dir().join("a1.json"))
            .unwrap_or_else(|e| panic!("read: {e}"));
        let value: serde_json::Value =
            serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parse: {e}"));

        for key in ["_id", "name", "creation_date", "access_keys", "nsfs_account_config"] {
            assert!(value.get(key).is_some(), "missing key {key}: {raw}");
        }
        let config = &value["nsfs_account_config"];
        assert_eq!(config["uid"], own_uid());
        assert!(config.get("new_buckets_path").is_some());
    }

    #[tokio::test]
    async fn test_should_report_not_found_for_unknown_account() {
        let env = make_env();
        let err = env
            .api
            .handle("account", "status", json!({"name": "ghost"}))
            .await;
        let Err(err) = err else {
            panic!("expected NotFound");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::NotFound);
    }
}
