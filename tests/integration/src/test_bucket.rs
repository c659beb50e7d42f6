//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{account_options, make_env};

    async fn add_owner(env: &crate::TestEnv) {
        env.api
            .handle("account", "add", account_options(env, "owner1"))
            .await
            .unwrap_or_else(|e| panic!("add owner: {e}"));
    }

    #[tokio::test]
    async fn test_should_create_bucket_under_existing_path() {
        let env = make_env();
        add_owner(&env).await;

        let path = env.dir.path().join("b1");
        std::fs::create_dir(&path).unwrap_or_else(|e| panic!("mkdir: {e}"));

        let response = env
            .api
            .handle(
                "bucket",
                "add",
                json!({"name": "b1", "owner": "owner1", "path": path.to_str()}),
            )
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));
        assert_eq!(response.reply["name"], "b1");
        assert_eq!(response.reply["bucket_owner"], "owner1");
        assert_eq!(response.reply["versioning"], "DISABLED");

        // The record references the owner by _id.
        let owner = env
            .api
            .configfs()
            .read_account("owner1")
            .await
            .unwrap_or_else(|e| panic!("read owner: {e}"));
        assert_eq!(response.reply["owner_account"], owner.id.as_str());
    }

    #[tokio::test]
    async fn test_should_create_underlying_storage_on_request() {
        let env = make_env();
        add_owner(&env).await;

        let path = env.dir.path().join("made-by-add");
        assert!(!path.exists());

        env.api
            .handle(
                "bucket",
                "add",
                json!({
                    "name": "b1",
                    "owner": "owner1",
                    "path": path.to_str(),
                    "should_create_underlying_storage": true,
                }),
            )
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_should_reject_bucket_with_missing_path() {
        let env = make_env();
        add_owner(&env).await;

        let err = env
            .api
            .handle(
                "bucket",
                "add",
                json!({"name": "b1", "owner": "owner1", "path": "/definitely/not/there"}),
            )
            .await;
        let Err(err) = err else {
            panic!("expected rejection");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_should_respect_allow_bucket_creation() {
        let env = make_env();
        let mut options = account_options(&env, "locked-down");
        options["allow_bucket_creation"] = json!(false);
        env.api
            .handle("account", "add", options)
            .await
            .unwrap_or_else(|e| panic!("add account: {e}"));

        let path = env.dir.path().join("b1");
        std::fs::create_dir(&path).unwrap_or_else(|e| panic!("mkdir: {e}"));
        let err = env
            .api
            .handle(
                "bucket",
                "add",
                json!({"name": "b1", "owner": "locked-down", "path": path.to_str()}),
            )
            .await;
        let Err(err) = err else {
            panic!("expected AccessDenied");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn test_should_update_versioning_and_list_wide() {
        let env = make_env();
        add_owner(&env).await;
        let path = env.dir.path().join("b1");
        std::fs::create_dir(&path).unwrap_or_else(|e| panic!("mkdir: {e}"));
        env.api
            .handle(
                "bucket",
                "add",
                json!({"name": "b1", "owner": "owner1", "path": path.to_str()}),
            )
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));

        let response = env
            .api
            .handle(
                "bucket",
                "update",
                json!({"name": "b1", "versioning": "ENABLED"}),
            )
            .await
            .unwrap_or_else(|e| panic!("update: {e}"));
        assert_eq!(response.reply["versioning"], "ENABLED");

        let err = env
            .api
            .handle(
                "bucket",
                "update",
                json!({"name": "b1", "versioning": "banana"}),
            )
            .await;
        assert!(err.is_err());

        let listing = env
            .api
            .handle("bucket", "list", json!({"wide": true}))
            .await
            .unwrap_or_else(|e| panic!("list: {e}"));
        let records = listing.reply.as_array().cloned().unwrap_or_default();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["versioning"], "ENABLED");

        let listing = env
            .api
            .handle("bucket", "list", json!({}))
            .await
            .unwrap_or_else(|e| panic!("list names: {e}"));
        assert_eq!(listing.reply, json!(["b1"]));
    }

    #[tokio::test]
    async fn test_should_delete_bucket_and_refuse_unknown_delete() {
        let env = make_env();
        add_owner(&env).await;
        let path = env.dir.path().join("b1");
        std::fs::create_dir(&path).unwrap_or_else(|e| panic!("mkdir: {e}"));
        env.api
            .handle(
                "bucket",
                "add",
                json!({"name": "b1", "owner": "owner1", "path": path.to_str()}),
            )
            .await
            .unwrap_or_else(|e| panic!("add: {e}"));

        env.api
            .handle("bucket", "delete", json!({"name": "b1"}))
            .await
            .unwrap_or_else(|e| panic!("delete: {e}"));

        let err = env
            .api
            .handle("bucket", "delete", json!({"name": "b1"}))
            .await;
        let Err(err) = err else {
            panic!("expected NotFound");
        };
        assert_eq!(err.code, nsfs_manage::ManageErrorCode::NotFound);
    }
}
