//! Account actions: add, update, list, status, delete.

use nsfs_core::FsIdentity;
use nsfs_model::{AccessKeyPair, Account, NsfsAccountConfig};
use serde_json::json;
use tracing::info;

use crate::api::ManageApi;
use crate::options::{AccountOptions, ListFilter, parse_options};
use crate::response::{ManageError, ManageErrorCode, ManageResponse, ResponseCode};
use crate::validation;

/// Dispatch one account action.
pub(crate) async fn handle(
    api: &ManageApi,
    action: &str,
    options: serde_json::Value,
) -> Result<ManageResponse, ManageError> {
    let options: AccountOptions = parse_options(options)?;
    match action {
        "add" => add(api, options).await,
        "update" => update(api, options).await,
        "list" => list(api, options).await,
        "status" => status(api, options).await,
        "delete" => delete(api, options).await,
        other => Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            format!("unknown account action: {other}"),
        )),
    }
}

async fn add(api: &ManageApi, options: AccountOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let identity = validation::identity_from_options(&options)?;

    let (access_key, secret_key) = match validation::check_key_pair(&options)? {
        Some(pair) => pair,
        None => validation::generate_key_pair(api.config().disable_init_random_seed),
    };

    let new_buckets_path = options.new_buckets_path.as_deref().ok_or_else(|| {
        ManageError::new(
            ManageErrorCode::InvalidArgument,
            "new_buckets_path is required",
        )
    })?;
    validation::validate_new_buckets_path(new_buckets_path, &identity).await?;

    let mut account = Account::new(name.clone(), account_config(&identity, new_buckets_path));
    account.email = options.email.clone();
    account.allow_bucket_creation = options.allow_bucket_creation;
    account.access_keys.push(AccessKeyPair {
        access_key,
        secret_key,
    });

    api.configfs().create_account(&account).await?;
    info!(account = %account.name, "account created");
    Ok(ManageResponse::new(
        ResponseCode::AccountCreated,
        account_to_value(&account, true)?,
    ))
}

async fn update(api: &ManageApi, options: AccountOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let old = api.configfs().read_account(&name).await?;
    let mut updated = old.clone();

    // Identity flags are optional on update, but when any is present the
    // whole form must be well-formed again.
    if options.uid.is_some() || options.gid.is_some() || options.user.is_some() {
        let identity = validation::identity_from_options(&options)?;
        let path = updated.nsfs_account_config.new_buckets_path.clone();
        updated.nsfs_account_config = account_config(&identity, &path);
    }
    if let Some(path) = &options.new_buckets_path {
        updated.nsfs_account_config.new_buckets_path.clone_from(path);
    }
    if let Some(email) = &options.email {
        updated.email = Some(email.clone());
    }
    if let Some(allow) = options.allow_bucket_creation {
        updated.allow_bucket_creation = Some(allow);
    }

    let explicit_pair = validation::check_key_pair(&options)?;
    if options.regenerate.unwrap_or(false) {
        if explicit_pair.is_some() {
            return Err(ManageError::new(
                ManageErrorCode::InvalidArgument,
                "regenerate conflicts with explicit access_key / secret_key",
            ));
        }
        let (access_key, secret_key) =
            validation::generate_key_pair(api.config().disable_init_random_seed);
        updated.access_keys = vec![AccessKeyPair {
            access_key,
            secret_key,
        }];
    } else if let Some((access_key, secret_key)) = explicit_pair {
        updated.access_keys = vec![AccessKeyPair {
            access_key,
            secret_key,
        }];
    }

    // The record must be usable as written: re-probe with the effective
    // identity and path.
    let identity = updated.nsfs_account_config.identity().ok_or_else(|| {
        ManageError::new(
            ManageErrorCode::InvalidArgument,
            "account identity is ambiguous after update",
        )
    })?;
    validation::validate_new_buckets_path(&updated.nsfs_account_config.new_buckets_path, &identity)
        .await?;

    api.configfs().update_account(&old, &updated).await?;
    api.cache().invalidate(&updated.id);
    info!(account = %updated.name, "account updated");
    Ok(ManageResponse::new(
        ResponseCode::AccountUpdated,
        account_to_value(&updated, true)?,
    ))
}

async fn list(api: &ManageApi, options: AccountOptions) -> Result<ManageResponse, ManageError> {
    let filter = ListFilter::from_account_options(&options);
    let show_secrets = options.show_secrets.unwrap_or(false);
    let accounts: Vec<Account> = api
        .configfs()
        .list_accounts()
        .await?
        .into_iter()
        .filter(|account| filter.matches(account))
        .collect();

    let reply = if options.wide.unwrap_or(false) {
        let records = accounts
            .iter()
            .map(|account| account_to_value(account, show_secrets))
            .collect::<Result<Vec<_>, _>>()?;
        json!(records)
    } else {
        let names: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
        json!(names)
    };
    Ok(ManageResponse::new(ResponseCode::AccountList, reply))
}

async fn status(api: &ManageApi, options: AccountOptions) -> Result<ManageResponse, ManageError> {
    let account = match (&options.name, &options.access_key) {
        (Some(name), _) => api.configfs().read_account(name).await?,
        (None, Some(access_key)) => api.configfs().get_account_by_access_key(access_key).await?,
        (None, None) => {
            return Err(ManageError::new(
                ManageErrorCode::MissingIdentifier,
                "account status needs name or access_key",
            ));
        }
    };
    Ok(ManageResponse::new(
        ResponseCode::AccountStatus,
        account_to_value(&account, options.show_secrets.unwrap_or(false))?,
    ))
}

async fn delete(api: &ManageApi, options: AccountOptions) -> Result<ManageResponse, ManageError> {
    let name = require_name(&options)?;
    let account = api.configfs().read_account(&name).await?;

    let owned: Vec<String> = api
        .configfs()
        .list_buckets()
        .await?
        .into_iter()
        .filter(|bucket| bucket.owner_account == account.id)
        .map(|bucket| bucket.name)
        .collect();
    if !owned.is_empty() {
        return Err(ManageError::with_cause(
            ManageErrorCode::AccountDeleteForbiddenHasBuckets,
            format!("account {name} still owns buckets and can not be deleted"),
            format!("owned buckets: {}", owned.join(", ")),
        ));
    }

    api.configfs().delete_account(&account).await?;
    api.cache().invalidate(&account.id);
    info!(account = %name, "account deleted");
    Ok(ManageResponse::new(
        ResponseCode::AccountDeleted,
        json!({ "name": name }),
    ))
}

fn require_name(options: &AccountOptions) -> Result<String, ManageError> {
    options.name.clone().ok_or_else(|| {
        ManageError::new(ManageErrorCode::MissingIdentifier, "account name is required")
    })
}

fn account_config(identity: &FsIdentity, new_buckets_path: &str) -> NsfsAccountConfig {
    match identity {
        FsIdentity::UidGid { uid, gid } => NsfsAccountConfig {
            uid: Some(*uid),
            gid: Some(*gid),
            distinguished_name: None,
            new_buckets_path: new_buckets_path.to_owned(),
        },
        FsIdentity::DistinguishedName(name) => NsfsAccountConfig {
            uid: None,
            gid: None,
            distinguished_name: Some(name.clone()),
            new_buckets_path: new_buckets_path.to_owned(),
        },
    }
}

/// Serialize an account for a reply, masking secrets unless asked not to.
fn account_to_value(account: &Account, show_secrets: bool) -> Result<serde_json::Value, ManageError> {
    let mut value = serde_json::to_value(account).map_err(|e| {
        ManageError::with_cause(
            ManageErrorCode::Io,
            "failed to serialize account",
            e.to_string(),
        )
    })?;
    if !show_secrets {
        if let Some(keys) = value
            .get_mut("access_keys")
            .and_then(serde_json::Value::as_array_mut)
        {
            for key in keys {
                if let Some(secret) = key.get_mut("secret_key") {
                    *secret = json!("****");
                }
            }
        }
    }
    Ok(value)
}
