//! Upgrade actions: start, status, history.

use std::path::PathBuf;

use nsfs_core::CONFIG_DIR_VERSION;
use nsfs_upgrade::{ScriptRegistry, StartArgs, UpgradeController, UpgradeError};
use serde_json::json;

use crate::api::ManageApi;
use crate::options::{UpgradeOptions, parse_options};
use crate::response::{ManageError, ManageErrorCode, ManageResponse, ResponseCode};

/// Dispatch one upgrade action.
pub(crate) async fn handle(
    api: &ManageApi,
    action: &str,
    options: serde_json::Value,
) -> Result<ManageResponse, ManageError> {
    let options: UpgradeOptions = parse_options(options)?;
    match action {
        "start" => start(api, options).await,
        "status" => status(api, options).await,
        "history" => history(api, options).await,
        other => Err(ManageError::new(
            ManageErrorCode::InvalidUpgradeAction,
            format!("unknown upgrade action: {other}"),
        )),
    }
}

async fn start(api: &ManageApi, options: UpgradeOptions) -> Result<ManageResponse, ManageError> {
    let expected_version = options.expected_version.clone().ok_or_else(|| {
        ManageError::new(
            ManageErrorCode::InvalidArgument,
            "expected_version is required",
        )
    })?;
    let expected_hosts = options.expected_hosts.as_deref().ok_or_else(|| {
        ManageError::new(
            ManageErrorCode::InvalidArgument,
            "expected_hosts is required",
        )
    })?;

    let args = StartArgs {
        expected_version,
        expected_hosts: StartArgs::parse_hosts(expected_hosts),
        skip_verification: options.skip_verification.unwrap_or(false),
    };

    let controller = build_controller(api, &options, ManageErrorCode::UpgradeFailed).await?;
    let outcome = controller
        .start(&args)
        .await
        .map_err(|e| map_upgrade_error(e, ManageErrorCode::UpgradeFailed))?;
    Ok(ManageResponse::new(
        ResponseCode::UpgradeSuccessful,
        json!({ "message": outcome.message }),
    ))
}

async fn status(api: &ManageApi, options: UpgradeOptions) -> Result<ManageResponse, ManageError> {
    let controller = build_controller(api, &options, ManageErrorCode::UpgradeStatusFailed).await?;
    let in_progress = controller
        .status()
        .await
        .map_err(|e| map_upgrade_error(e, ManageErrorCode::UpgradeStatusFailed))?;

    let reply = match in_progress {
        Some(record) => serde_json::to_value(record).map_err(|e| {
            ManageError::with_cause(
                ManageErrorCode::UpgradeStatusFailed,
                "failed to serialize upgrade status",
                e.to_string(),
            )
        })?,
        None => json!({ "message": "there is no in-progress config directory upgrade" }),
    };
    Ok(ManageResponse::new(ResponseCode::UpgradeStatus, reply))
}

async fn history(api: &ManageApi, options: UpgradeOptions) -> Result<ManageResponse, ManageError> {
    let controller = build_controller(api, &options, ManageErrorCode::UpgradeHistoryFailed).await?;
    let upgrade_history = controller
        .history()
        .await
        .map_err(|e| map_upgrade_error(e, ManageErrorCode::UpgradeHistoryFailed))?;

    let reply = match upgrade_history {
        Some(record) => serde_json::to_value(record).map_err(|e| {
            ManageError::with_cause(
                ManageErrorCode::UpgradeHistoryFailed,
                "failed to serialize upgrade history",
                e.to_string(),
            )
        })?,
        None => json!({ "message": "there is no config directory upgrade history" }),
    };
    Ok(ManageResponse::new(ResponseCode::UpgradeHistory, reply))
}

/// Build the controller with built-in scripts plus any operator directory.
async fn build_controller(
    api: &ManageApi,
    options: &UpgradeOptions,
    code: ManageErrorCode,
) -> Result<UpgradeController, ManageError> {
    let mut registry =
        ScriptRegistry::builtin().map_err(|e| map_upgrade_error(e, code))?;

    let scripts_dir = options
        .custom_upgrade_scripts_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| api.config().upgrade_scripts_dir.clone());
    if let Some(dir) = scripts_dir {
        registry
            .discover(&dir)
            .await
            .map_err(|e| map_upgrade_error(e, code))?;
    }

    UpgradeController::new(
        api.configfs().clone(),
        registry,
        api.config().package_version.clone(),
        CONFIG_DIR_VERSION.to_owned(),
    )
    .map_err(|e| map_upgrade_error(e, code))
}

/// All controller failures surface under the action's error code, with the
/// controller's explanation as the cause.
fn map_upgrade_error(error: UpgradeError, code: ManageErrorCode) -> ManageError {
    let message = match code {
        ManageErrorCode::UpgradeStatusFailed => "config dir upgrade status failed",
        ManageErrorCode::UpgradeHistoryFailed => "config dir upgrade history failed",
        _ => "config dir upgrade failed",
    };
    ManageError::with_cause(code, message, error.to_string())
}
