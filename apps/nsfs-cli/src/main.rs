//! NSFS management CLI.
//!
//! Subcommand form: `nsfs-cli <type> <action> [--flag value]*` where the
//! type is `account`, `bucket`, or `upgrade`. Output is a single JSON
//! object on stdout: `{"response": ...}` on success, `{"error": ...}` on
//! failure.
//!
//! Exit codes: `0` success, `1` usage, `2` internal error.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NSFS_NC_DEFAULT_CONF_DIR` | `/etc/noobaa.conf.d` | Config root |
//! | `NSFS_GLACIER_LOGS_DIR` | `/var/log/noobaa/wal` | WAL directory |
//! | `CONFIG_ROOT_BACKEND` | `none` | `none` or `GPFS` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained filter (overrides `LOG_LEVEL`) |
//! | `DISABLE_INIT_RANDOM_SEED` | `false` | Deterministic keys (test-only) |

mod args;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nsfs_core::NsfsConfig;
use nsfs_manage::ManageApi;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config
/// value. Logs go to stderr; stdout carries only the JSON result.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Clap renders its own message (including --help / --version).
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("error: {e}");
        return ExitCode::from(1);
    }

    let (entity, action, options) = match cli.into_call() {
        Ok(call) => call,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    debug!(entity, action, "invoking management API");

    let api = ManageApi::new(config);
    match api.handle(&entity, &action, options).await {
        Ok(response) => {
            println!("{}", response.to_wire());
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("{}", error.to_wire());
            ExitCode::from(2)
        }
    }
}

/// Environment config with CLI-flag overrides applied.
fn build_config(cli: &Cli) -> Result<NsfsConfig> {
    let mut config = NsfsConfig::from_env()?;
    if let Some(config_root) = &cli.config_root {
        config.config_root.clone_from(config_root);
    }
    if let Some(backend) = &cli.config_root_backend {
        config.config_root_backend = nsfs_core::ConfigRootBackend::parse(backend)?;
    }
    Ok(config)
}
