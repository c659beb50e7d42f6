//! Distinguished-name resolution through the host user database.

use nix::unistd::User;
use nsfs_core::FsIdentity;
use tracing::debug;

use crate::error::{IdentityError, IdentityResult};

/// Resolve either identity form to a concrete `(uid, gid)` pair.
///
/// The numeric form passes through; the distinguished-name form goes to the
/// user database on a blocking thread.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidDistinguishedName`] when a named
/// identity does not resolve.
pub async fn resolve_identity(identity: &FsIdentity) -> IdentityResult<(u32, u32)> {
    match identity {
        FsIdentity::UidGid { uid, gid } => Ok((*uid, *gid)),
        FsIdentity::DistinguishedName(name) => {
            let name = name.clone();
            tokio::task::spawn_blocking(move || resolve_distinguished_name(&name))
                .await
                .map_err(|e| IdentityError::Internal(anyhow::anyhow!("resolve task failed: {e}")))?
        }
    }
}

/// Resolve a distinguished name to its `(uid, gid)` pair.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidDistinguishedName`] when the name is not
/// present in the user database, and [`IdentityError::Internal`] when the
/// database itself cannot be read.
pub fn resolve_distinguished_name(name: &str) -> IdentityResult<(u32, u32)> {
    let user = User::from_name(name)
        .map_err(|e| anyhow::anyhow!("user database lookup for {name:?} failed: {e}"))?
        .ok_or_else(|| IdentityError::InvalidDistinguishedName {
            name: name.to_owned(),
        })?;

    let uid = user.uid.as_raw();
    let gid = user.gid.as_raw();
    debug!(name, uid, gid, "resolved distinguished name");
    Ok((uid, gid))
}
