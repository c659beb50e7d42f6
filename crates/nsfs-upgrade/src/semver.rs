//! The version ordering used for script discovery and cluster gating.
//!
//! Deliberately simpler than full semver: dot-separated integer parts
//! compared lexicographically, with missing parts treated as zero and any
//! pre-release suffix after `-` stripped before parsing. The ordering is
//! total; `"1.0"`, `"1.0.0"`, and `"1.0.0-rc.1"` all compare equal.

use std::cmp::Ordering;
use std::fmt;

use tracing::warn;

use crate::error::{UpgradeError, UpgradeResult};

/// A parsed version, retaining the original spelling.
#[derive(Debug, Clone)]
pub struct Semver {
    raw: String,
    parts: Vec<u64>,
}

impl Semver {
    /// Parse a version string.
    ///
    /// `"5.17.0-rc.1"` parses as `[5, 17, 0]`.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidVersion`] when any dot-separated part
    /// of the core is not an unsigned integer.
    pub fn parse(raw: &str) -> UpgradeResult<Self> {
        let core = raw.split('-').next().unwrap_or(raw);
        let parts = core
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .map_err(|_| UpgradeError::InvalidVersion {
                version: raw.to_owned(),
            })?;
        if parts.is_empty() {
            return Err(UpgradeError::InvalidVersion {
                version: raw.to_owned(),
            });
        }
        Ok(Self {
            raw: raw.to_owned(),
            parts,
        })
    }

    /// The original spelling, suffix included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compare, warning when two differently spelled versions land equal
    /// (e.g. the same core with different build suffixes).
    #[must_use]
    pub fn cmp_warn_on_suffix(&self, other: &Self) -> Ordering {
        let ordering = self.cmp(other);
        if ordering == Ordering::Equal && self.raw != other.raw {
            warn!(
                left = %self.raw,
                right = %other.raw,
                "versions compare equal despite different spellings"
            );
        }
        ordering
    }
}

impl fmt::Display for Semver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Semver {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Semver {}

impl Ord for Semver {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let left = self.parts.get(i).copied().unwrap_or(0);
            let right = other.parts.get(i).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Semver {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
