//! CLI argument model and its mapping onto management-API options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};

/// Management CLI for the NSFS control plane.
#[derive(Debug, Parser)]
#[command(name = "nsfs-cli", version, about, long_about = None)]
pub struct Cli {
    /// Root directory holding all control-plane state.
    #[arg(long = "config_root", global = true, value_name = "DIR")]
    pub config_root: Option<PathBuf>,

    /// Backend of the config root filesystem: none or GPFS.
    #[arg(long = "config_root_backend", global = true, value_name = "BACKEND")]
    pub config_root_backend: Option<String>,

    #[command(subcommand)]
    pub command: TypeCommand,
}

/// The entity type being managed.
#[derive(Debug, Subcommand)]
pub enum TypeCommand {
    /// Manage accounts: add, update, list, status, delete.
    Account(ActionArgs),
    /// Manage buckets: add, update, list, status, delete.
    Bucket(ActionArgs),
    /// Manage config-directory upgrades: start, status, history.
    Upgrade(ActionArgs),
}

/// An action plus every documented flag; flags not given stay out of the
/// options object, so the API's strict option validation still applies.
#[derive(Debug, Args)]
pub struct ActionArgs {
    /// The action to perform.
    pub action: String,

    /// Load the options object from a JSON file; explicit flags override.
    #[arg(long = "from_file", value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// Entity name.
    #[arg(long)]
    pub name: Option<String>,

    /// Account identity: uid.
    #[arg(long)]
    pub uid: Option<u32>,

    /// Account identity: gid.
    #[arg(long)]
    pub gid: Option<u32>,

    /// Account identity: distinguished name.
    #[arg(long)]
    pub user: Option<String>,

    /// Directory the account creates buckets under.
    #[arg(long = "new_buckets_path", value_name = "DIR")]
    pub new_buckets_path: Option<String>,

    /// Explicit access key.
    #[arg(long = "access_key")]
    pub access_key: Option<String>,

    /// Explicit secret key.
    #[arg(long = "secret_key")]
    pub secret_key: Option<String>,

    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,

    /// Rotate to freshly generated keys on update.
    #[arg(long)]
    pub regenerate: bool,

    /// Whether the account may create buckets.
    #[arg(long = "allow_bucket_creation")]
    pub allow_bucket_creation: Option<bool>,

    /// Full records in listings instead of names only.
    #[arg(long)]
    pub wide: bool,

    /// Include secret keys in replies.
    #[arg(long = "show_secrets")]
    pub show_secrets: bool,

    /// Owning account name (buckets).
    #[arg(long)]
    pub owner: Option<String>,

    /// Bucket contents directory.
    #[arg(long, value_name = "DIR")]
    pub path: Option<String>,

    /// Bucket versioning: DISABLED, ENABLED, or SUSPENDED.
    #[arg(long)]
    pub versioning: Option<String>,

    /// Create the underlying bucket directory on add.
    #[arg(long = "should_create_underlying_storage")]
    pub should_create_underlying_storage: bool,

    /// Free-form bucket tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Filesystem backend override for the bucket path.
    #[arg(long = "fs_backend")]
    pub fs_backend: Option<String>,

    /// Package version the caller believes is deployed everywhere.
    #[arg(long = "expected_version")]
    pub expected_version: Option<String>,

    /// Comma-separated hostnames forming the deployment.
    #[arg(long = "expected_hosts")]
    pub expected_hosts: Option<String>,

    /// Bypass the upgrade's cluster verification gates.
    #[arg(long = "skip_verification")]
    pub skip_verification: bool,

    /// Operator-supplied upgrade scripts directory.
    #[arg(long = "custom_upgrade_scripts_dir", value_name = "DIR")]
    pub custom_upgrade_scripts_dir: Option<String>,
}

impl Cli {
    /// Resolve into the `(type, action, options)` triple the API takes.
    pub fn into_call(self) -> Result<(String, String, Value)> {
        let (entity, args) = match self.command {
            TypeCommand::Account(args) => ("account", args),
            TypeCommand::Bucket(args) => ("bucket", args),
            TypeCommand::Upgrade(args) => ("upgrade", args),
        };
        let action = args.action.clone();
        let options = args.into_options()?;
        Ok((entity.to_owned(), action, options))
    }
}

impl ActionArgs {
    /// Build the options object: `--from_file` content first, explicit
    /// flags layered on top.
    fn into_options(self) -> Result<Value> {
        let mut options: Map<String, Value> = match &self.from_file {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                let value: Value = serde_json::from_slice(&bytes)
                    .with_context(|| format!("cannot parse {}", path.display()))?;
                match value {
                    Value::Object(map) => map,
                    _ => anyhow::bail!("{} must contain a JSON object", path.display()),
                }
            }
            None => Map::new(),
        };

        set_string(&mut options, "name", self.name);
        set_number(&mut options, "uid", self.uid);
        set_number(&mut options, "gid", self.gid);
        set_string(&mut options, "user", self.user);
        set_string(&mut options, "new_buckets_path", self.new_buckets_path);
        set_string(&mut options, "access_key", self.access_key);
        set_string(&mut options, "secret_key", self.secret_key);
        set_string(&mut options, "email", self.email);
        set_flag(&mut options, "regenerate", self.regenerate);
        if let Some(allow) = self.allow_bucket_creation {
            options.insert("allow_bucket_creation".to_owned(), json!(allow));
        }
        set_flag(&mut options, "wide", self.wide);
        set_flag(&mut options, "show_secrets", self.show_secrets);
        set_string(&mut options, "owner", self.owner);
        set_string(&mut options, "path", self.path);
        set_string(&mut options, "versioning", self.versioning);
        set_flag(
            &mut options,
            "should_create_underlying_storage",
            self.should_create_underlying_storage,
        );
        set_string(&mut options, "tag", self.tag);
        set_string(&mut options, "fs_backend", self.fs_backend);
        set_string(&mut options, "expected_version", self.expected_version);
        set_string(&mut options, "expected_hosts", self.expected_hosts);
        set_flag(&mut options, "skip_verification", self.skip_verification);
        set_string(
            &mut options,
            "custom_upgrade_scripts_dir",
            self.custom_upgrade_scripts_dir,
        );

        Ok(Value::Object(options))
    }
}

fn set_string(options: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        options.insert(key.to_owned(), json!(value));
    }
}

fn set_number(options: &mut Map<String, Value>, key: &str, value: Option<u32>) {
    if let Some(value) = value {
        options.insert(key.to_owned(), json!(value));
    }
}

fn set_flag(options: &mut Map<String, Value>, key: &str, value: bool) {
    if value {
        options.insert(key.to_owned(), json!(true));
    }
}
