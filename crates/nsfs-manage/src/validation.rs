//! Account validation: identity exclusivity, key formats, path probes.

use std::path::Path;
use std::sync::LazyLock;

use nsfs_core::FsIdentity;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use regex::Regex;

use crate::options::AccountOptions;
use crate::response::{ManageError, ManageErrorCode};

/// Access keys: exactly 20 alphanumeric characters.
static ACCESS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{20}$").expect("static regex compiles"));

/// Secret keys: exactly 40 characters of the base64 alphabet.
static SECRET_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]{40}$").expect("static regex compiles"));

const ACCESS_KEY_LEN: usize = 20;
const SECRET_KEY_LEN: usize = 40;

const ACCESS_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SECRET_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Extract the account identity from the options.
///
/// Exactly one form must be supplied: `uid` + `gid`, or `user`.
pub fn identity_from_options(options: &AccountOptions) -> Result<FsIdentity, ManageError> {
    match (options.uid, options.gid, options.user.as_ref()) {
        (Some(uid), Some(gid), None) => Ok(FsIdentity::UidGid { uid, gid }),
        (None, None, Some(user)) => Ok(FsIdentity::DistinguishedName(user.clone())),
        (None, None, None) => Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            "account identity is required: supply either uid and gid, or user",
        )),
        _ => Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            "account identity is ambiguous: supply either uid and gid, or user, not both",
        )),
    }
}

/// Check the access / secret key pair rules for a create.
///
/// Both or neither must be supplied; each supplied key must match its
/// format. Returns the explicit pair when both were given.
pub fn check_key_pair(
    options: &AccountOptions,
) -> Result<Option<(String, String)>, ManageError> {
    match (options.access_key.as_ref(), options.secret_key.as_ref()) {
        (None, None) => Ok(None),
        (Some(access_key), Some(secret_key)) => {
            validate_access_key_format(access_key)?;
            validate_secret_key_format(secret_key)?;
            Ok(Some((access_key.clone(), secret_key.clone())))
        }
        (Some(_), None) => Err(ManageError::new(
            ManageErrorCode::AccountAccessKeyFlagComplexity,
            "access_key was supplied without secret_key",
        )),
        (None, Some(_)) => Err(ManageError::new(
            ManageErrorCode::AccountSecretKeyFlagComplexity,
            "secret_key was supplied without access_key",
        )),
    }
}

/// Validate the access-key format.
pub fn validate_access_key_format(access_key: &str) -> Result<(), ManageError> {
    if ACCESS_KEY_RE.is_match(access_key) {
        Ok(())
    } else {
        Err(ManageError::new(
            ManageErrorCode::AccountAccessKeyFlagComplexity,
            format!("access_key must be {ACCESS_KEY_LEN} alphanumeric characters"),
        ))
    }
}

/// Validate the secret-key format.
pub fn validate_secret_key_format(secret_key: &str) -> Result<(), ManageError> {
    if SECRET_KEY_RE.is_match(secret_key) {
        Ok(())
    } else {
        Err(ManageError::new(
            ManageErrorCode::AccountSecretKeyFlagComplexity,
            format!("secret_key must be {SECRET_KEY_LEN} characters of A-Za-z0-9+/"),
        ))
    }
}

/// Generate a fresh access/secret pair.
///
/// `deterministic` (test-only, `DISABLE_INIT_RANDOM_SEED`) produces the
/// same pair on every call.
#[must_use]
pub fn generate_key_pair(deterministic: bool) -> (String, String) {
    let mut rng = make_rng(deterministic);
    let access_key = random_key(&mut rng, ACCESS_KEY_LEN, ACCESS_KEY_ALPHABET);
    let secret_key = random_key(&mut rng, SECRET_KEY_LEN, SECRET_KEY_ALPHABET);
    (access_key, secret_key)
}

/// Probe `new_buckets_path` for read + write under the account identity.
pub async fn validate_new_buckets_path(
    path: &str,
    identity: &FsIdentity,
) -> Result<(), ManageError> {
    if path.is_empty() {
        return Err(ManageError::new(
            ManageErrorCode::InvalidArgument,
            "new_buckets_path must be a non-empty string",
        ));
    }
    let (uid, gid) = nsfs_identity::resolve_identity(identity).await?;
    nsfs_identity::probe_access(Path::new(path), uid, gid).await?;
    Ok(())
}

fn make_rng(deterministic: bool) -> StdRng {
    if deterministic {
        StdRng::seed_from_u64(0)
    } else {
        rand::make_rng()
    }
}

fn random_key(rng: &mut StdRng, len: usize, alphabet: &[u8]) -> String {
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}
