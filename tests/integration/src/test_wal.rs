//! Glacier WAL integration tests: upload-to-segment round trips, restore
//! stamping, and at-least-once retention.

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use chrono::{Duration, Utc};
    use nsfs_core::{ConfigRootBackend, FsContext};
    use nsfs_glacier::{Glacier, GlacierBackend, GlacierResult, RestoreStatus};
    use parking_lot::Mutex;

    use crate::make_env;

    /// A scripted tape stack standing in for the vendor backend.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        migrate_calls: Mutex<Vec<Vec<String>>>,
        retain_all: bool,
        restore_days: u32,
    }

    #[async_trait::async_trait]
    impl GlacierBackend for ScriptedBackend {
        async fn should_migrate(&self, _ctx: &FsContext, _path: &Path) -> GlacierResult<bool> {
            Ok(true)
        }

        async fn migrate(&self, _ctx: &FsContext, segment: &Path) -> GlacierResult<Vec<PathBuf>> {
            let records = nsfs_wal::read_records(segment).await?;
            let failed = if self.retain_all {
                records.iter().map(PathBuf::from).collect()
            } else {
                Vec::new()
            };
            self.migrate_calls.lock().push(records);
            Ok(failed)
        }

        async fn restore(&self, _ctx: &FsContext, segment: &Path) -> GlacierResult<bool> {
            for record in nsfs_wal::read_records(segment).await? {
                let object = PathBuf::from(&record);
                let days = nsfs_glacier::get_restore_request(&object)
                    .await?
                    .unwrap_or(self.restore_days);
                nsfs_glacier::clear_restore_request(&object).await?;
                nsfs_glacier::set_restore_status(
                    &object,
                    &RestoreStatus::restored_until(Utc::now() + Duration::days(i64::from(days))),
                )
                .await?;
            }
            Ok(true)
        }

        async fn process_expired(&self, _ctx: &FsContext, _path: &Path) -> GlacierResult<()> {
            Ok(())
        }
    }

    async fn make_glacier(logs_dir: &Path) -> Glacier {
        Glacier::open(logs_dir, FsContext::service(ConfigRootBackend::None), 512)
            .await
            .unwrap_or_else(|e| panic!("open glacier: {e}"))
    }

    #[tokio::test]
    async fn test_should_seal_glacier_uploads_in_upload_order() {
        let env = make_env();
        let glacier = make_glacier(&env.dir.path().join("wal")).await;

        // Three GLACIER-class uploads, recorded in order.
        for key in ["k1", "k2", "k3"] {
            glacier
                .record_migrate(&PathBuf::from(format!("/mnt/fs1/b1/{key}")))
                .await
                .unwrap_or_else(|e| panic!("record: {e}"));
        }

        // Seal, then process with a handler that retains.
        let backend = ScriptedBackend {
            retain_all: true,
            ..ScriptedBackend::default()
        };
        glacier
            .run_migrations(&backend)
            .await
            .unwrap_or_else(|e| panic!("run: {e}"));

        // The sealed segment carried exactly the three paths, in order.
        assert_eq!(
            backend.migrate_calls.lock().as_slice(),
            &[vec![
                "/mnt/fs1/b1/k1".to_owned(),
                "/mnt/fs1/b1/k2".to_owned(),
                "/mnt/fs1/b1/k3".to_owned(),
            ]]
        );

        // Retained: a later pass sees the same segment again.
        glacier
            .run_migrations(&backend)
            .await
            .unwrap_or_else(|e| panic!("second run: {e}"));
        assert_eq!(backend.migrate_calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_should_delete_segment_once_migrated() {
        let env = make_env();
        let glacier = make_glacier(&env.dir.path().join("wal")).await;
        glacier
            .record_migrate(Path::new("/mnt/fs1/b1/k1"))
            .await
            .unwrap_or_else(|e| panic!("record: {e}"));

        let backend = ScriptedBackend::default();
        let deleted = glacier
            .run_migrations(&backend)
            .await
            .unwrap_or_else(|e| panic!("run: {e}"));
        assert_eq!(deleted, 1);

        // Nothing left for a second pass.
        glacier
            .run_migrations(&backend)
            .await
            .unwrap_or_else(|e| panic!("second run: {e}"));
        assert_eq!(backend.migrate_calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_should_restore_object_with_one_day_expiry() {
        let env = make_env();
        let glacier = make_glacier(&env.dir.path().join("wal")).await;

        let object = env.dir.path().join("restored.dat");
        std::fs::write(&object, b"cold data").unwrap_or_else(|e| panic!("write: {e}"));

        glacier
            .restore_object(&object, 1)
            .await
            .unwrap_or_else(|e| panic!("restore_object: {e}"));

        // Queued state: ongoing.
        let status = nsfs_glacier::get_restore_status(&object)
            .await
            .unwrap_or_else(|e| panic!("status: {e}"))
            .unwrap_or_else(|| panic!("expected status"));
        assert!(status.ongoing);

        let backend = ScriptedBackend::default();
        glacier
            .run_restores(&backend)
            .await
            .unwrap_or_else(|e| panic!("run: {e}"));

        // Restored: not ongoing, expiry dated tomorrow.
        let status = nsfs_glacier::get_restore_status(&object)
            .await
            .unwrap_or_else(|e| panic!("status: {e}"))
            .unwrap_or_else(|| panic!("expected status"));
        assert!(!status.ongoing);
        let expiry = status
            .expiry_time
            .unwrap_or_else(|| panic!("expected expiry"));
        assert_eq!(
            expiry.date_naive(),
            (Utc::now() + Duration::days(1)).date_naive()
        );
    }

    #[tokio::test]
    async fn test_should_not_swap_empty_wal_twice() {
        let env = make_env();
        let glacier = make_glacier(&env.dir.path().join("wal")).await;

        glacier
            .record_migrate(Path::new("/p/one"))
            .await
            .unwrap_or_else(|e| panic!("record: {e}"));
        assert!(
            glacier
                .migrate_wal()
                .swap()
                .await
                .unwrap_or_else(|e| panic!("swap: {e}"))
                .is_some()
        );
        // No intervening appends: no new inactive segment.
        assert!(
            glacier
                .migrate_wal()
                .swap()
                .await
                .unwrap_or_else(|e| panic!("swap again: {e}"))
                .is_none()
        );
        assert_eq!(
            glacier
                .migrate_wal()
                .inactive_segments()
                .await
                .unwrap_or_else(|e| panic!("list: {e}"))
                .len(),
            1
        );
    }
}
