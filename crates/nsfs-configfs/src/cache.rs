//! Bounded, TTL-limited account-by-id cache.
//!
//! Used by log-export style readers that resolve owner accounts at high
//! frequency. Strictly per-process: any update or delete of an account in
//! this process must invalidate its entry.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use nsfs_model::Account;
use tracing::trace;

/// Upper bound on cached entries; eviction is wholesale (clear) since the
/// cache exists only to absorb bursts, not to be a store.
const MAX_ENTRIES: usize = 1000;

/// A small TTL cache mapping account `_id` to the account record.
#[derive(Debug)]
pub struct AccountCache {
    entries: DashMap<String, (Account, Instant)>,
    ttl: Duration,
}

impl AccountCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a live entry, or `None` when absent or expired.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Account> {
        let entry = self.entries.get(id)?;
        let (account, inserted_at) = entry.value();
        if inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(id);
            return None;
        }
        Some(account.clone())
    }

    /// Insert or refresh an entry.
    pub fn put(&self, account: Account) {
        if self.entries.len() >= MAX_ENTRIES {
            trace!("account cache full, clearing");
            self.entries.clear();
        }
        self.entries
            .insert(account.id.clone(), (account, Instant::now()));
    }

    /// Drop the entry for `id`, if present. Must be called on every update
    /// or delete of the corresponding record within this process.
    pub fn invalidate(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Number of live (possibly expired, not yet reaped) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
