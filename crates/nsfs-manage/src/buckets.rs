//! Bucket actions: add, update, list, status, delete.

use std::path::Path;

use nsfs_model::{Bucket, VersioningStatus};
use serde_json::json;
use tracing::info;

use crate::api::ManageApi;
use crate::options::{BucketOptions, parse_options};
use crate::response::{ManageError, ManageErrorCode, ManageResponse, ResponseCode};

/// Dispatch one bucket action.
pub(crate) async fn handle(
    api: &ManageApi,
    action: &str,
    options: serde_json::Value,
) -> Result<ManageResponse, ManageError> {
    let options: BucketOptions = parse_options(options)?;
    match action {
        "add" => add(api, options).await,
        "update" => update(api, options).await,
        "list" => list(api, options).await,
        "status" => status(api, options).await,
        "delete" => delete(api, options).await,
        other => Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            format!("unknown bucket action: {other}"),
        )),
    }
}

async fn add(api: &ManageApi, options: BucketOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let owner = options.owner.as_deref().ok_or_else(|| {
        ManageError::new(ManageErrorCode::InvalidArgument, "bucket owner is required")
    })?;
    let path = options.path.as_deref().ok_or_else(|| {
        ManageError::new(ManageErrorCode::InvalidArgument, "bucket path is required")
    })?;

    let account = api.configfs().read_account(owner).await?;
    if !account.may_create_buckets() {
        return Err(ManageError::new(
            ManageErrorCode::AccessDenied,
            format!("account {owner} is not allowed to create buckets"),
        ));
    }

    let create_storage = options.should_create_underlying_storage.unwrap_or(false);
    if create_storage {
        create_bucket_storage(path, &account).await?;
    }
    if !Path::new(path).is_dir() {
        return Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            format!("bucket path does not exist: {path}"),
        ));
    }

    let mut bucket = Bucket::new(
        name.clone(),
        account.id.clone(),
        account.name.clone(),
        path.to_owned(),
    );
    bucket.should_create_underlying_storage = create_storage;
    if let Some(versioning) = options.versioning.as_deref() {
        bucket.versioning = parse_versioning(versioning)?;
    }
    bucket.tag = options.tag.clone();
    bucket.fs_backend = options.fs_backend.clone();

    api.configfs().create_bucket(&bucket).await?;
    info!(bucket = %bucket.name, owner = %account.name, "bucket created");
    Ok(ManageResponse::new(
        ResponseCode::BucketCreated,
        to_value(&bucket)?,
    ))
}

async fn update(api: &ManageApi, options: BucketOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let mut bucket = api.configfs().read_bucket(&name).await?;

    if let Some(owner) = options.owner.as_deref() {
        let account = api.configfs().read_account(owner).await?;
        bucket.owner_account = account.id;
        bucket.bucket_owner = account.name;
    }
    if let Some(path) = options.path.as_deref() {
        if !Path::new(path).is_dir() {
            return Err(ManageError::new(
                ManageErrorCode::InvalidArgument,
                format!("bucket path does not exist: {path}"),
            ));
        }
        bucket.path = path.to_owned();
    }
    if let Some(versioning) = options.versioning.as_deref() {
        bucket.versioning = parse_versioning(versioning)?;
    }
    if let Some(tag) = &options.tag {
        bucket.tag = Some(tag.clone());
    }
    if let Some(fs_backend) = &options.fs_backend {
        bucket.fs_backend = Some(fs_backend.clone());
    }

    api.configfs().update_bucket(&bucket).await?;
    info!(bucket = %name, "bucket updated");
    Ok(ManageResponse::new(
        ResponseCode::BucketUpdated,
        to_value(&bucket)?,
    ))
}

async fn list(api: &ManageApi, options: BucketOptions) -> Result<ManageResponse, ManageError> {
    let buckets: Vec<Bucket> = api
        .configfs()
        .list_buckets()
        .await?
        .into_iter()
        .filter(|bucket| {
            options
                .name
                .as_deref()
                .is_none_or(|name| bucket.name == name)
        })
        .collect();

    let reply = if options.wide.unwrap_or(false) {
        let records = buckets.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
        json!(records)
    } else {
        let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        json!(names)
    };
    Ok(ManageResponse::new(ResponseCode::BucketList, reply))
}

async fn status(api: &ManageApi, options: BucketOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let bucket = api.configfs().read_bucket(&name).await?;
    Ok(ManageResponse::new(
        ResponseCode::BucketStatus,
        to_value(&bucket)?,
    ))
}

async fn delete(api: &ManageApi, options: BucketOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    // Fail loudly on unknown buckets; the raw delete is idempotent.
    api.configfs().read_bucket(&name).await?;
    api.configfs().delete_bucket(&name).await?;
    info!(bucket = %name, "bucket deleted");
    Ok(ManageResponse::new(
        ResponseCode::BucketDeleted,
        json!({ "name": name }),
    ))
}

/// Create the bucket's backing directory owned by the account identity.
async fn create_bucket_storage(
    path: &str,
    account: &nsfs_model::Account,
) -> Result<(), ManageError> {
    let identity = account.nsfs_account_config.identity().ok_or_else(|| {
        ManageError::new(
            ManageErrorCode::InvalidArgument,
            format!("account {} has an ambiguous identity", account.name),
        )
    })?;
    let (uid, gid) = nsfs_identity::resolve_identity(&identity).await?;

    let path_buf = std::path::PathBuf::from(path);
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&path_buf).map_err(|e| {
            ManageError::with_cause(
                ManageErrorCode::Io,
                format!("failed to create bucket storage {}", path_buf.display()),
                e.to_string(),
            )
        })?;
        nix::unistd::chown(
            &path_buf,
            Some(nix::unistd::Uid::from_raw(uid)),
            Some(nix::unistd::Gid::from_raw(gid)),
        )
        .map_err(|e| {
            ManageError::with_cause(
                ManageErrorCode::Io,
                format!("failed to chown bucket storage {}", path_buf.display()),
                e.to_string(),
            )
        })
    })
    .await
    .map_err(|e| {
        ManageError::with_cause(ManageErrorCode::Io, "storage task failed", e.to_string())
    })?
}

fn parse_versioning(value: &str) -> Result<VersioningStatus, ManageError> {
    match value {
        "DISABLED" => Ok(VersioningStatus::Disabled),
        "ENABLED" => Ok(VersioningStatus::Enabled),
        "SUSPENDED" => Ok(VersioningStatus::Suspended),
        other => Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            format!("versioning must be DISABLED, ENABLED, or SUSPENDED, got {other}"),
        )),
    }
}

fn require_name(options: &BucketOptions) -> Result<String, ManageError> {
    options.name.clone().ok_or_else(|| {
        ManageError::new(ManageErrorCode::MissingIdentifier, "bucket name is required")
    })
}

fn to_value(bucket: &Bucket) -> Result<serde_json::Value, ManageError> {
    serde_json::to_value(bucket).map_err(|e| {
        ManageError::with_cause(
            ManageErrorCode::Io,
            "failed to serialize bucket",
            e.to_string(),
        )
    })
}
