//! Time-bounded memoization of RBAC grants.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::principal::GrantRecord;

/// Grant cache keyed by the raw identity header.
///
/// Decouples RBAC call volume from request volume: within one TTL window a
/// caller costs at most one remote round trip per observed miss. Entries for
/// the same key are replaced, never accumulated, and an entry is never
/// returned at or after its deadline.
pub struct GrantCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

struct CacheEntry {
    grant: GrantRecord,
    expires_at: Instant,
}

impl GrantCache {
    /// The TTL comes from configuration; it is not a property of this type.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<GrantRecord> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .and_then(|entry| (entry.expires_at > now).then_some(entry.grant));
        if hit.is_none() {
            // Expired entries are dropped on observation, not just on replacement.
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        hit
    }

    pub fn put(&self, key: &str, grant: GrantRecord) {
        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                grant,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}
