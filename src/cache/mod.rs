//! Avatar cache
//!
//! In-memory TTL cache mapping a user identifier to its most recently
//! resolved [`AvatarDescriptor`]. Expiry is lazy: an entry past its deadline
//! is treated as absent and evicted by the read that observes it, so no stale
//! value is ever returned. Inserts unconditionally supersede older entries
//! for the same key (last write wins, no merging).
//!
//! Operations never fail and never suspend; a single coarse `RwLock` is
//! enough at the expected scale and keeps reads for unrelated identifiers
//! from blocking each other.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::AvatarDescriptor;
use crate::utils::time::SharedClock;

#[derive(Debug, Clone)]
struct CacheEntry {
    descriptor: AvatarDescriptor,
    expires_at: Instant,
}

/// TTL cache for resolved avatar descriptors, shared across requests.
pub struct AvatarCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: SharedClock,
}

impl AvatarCache {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Look up the descriptor for `user_id`.
    ///
    /// Returns `None` both when no entry exists and when the entry has passed
    /// its expiry instant. An expired entry is removed on the way out.
    pub fn get(&self, user_id: &str) -> Option<AvatarDescriptor> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(user_id) {
                Some(entry) if now < entry.expires_at => {
                    return Some(entry.descriptor.clone());
                }
                Some(_) => {} // expired, evict below
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(user_id) {
            // A fresh insert may have raced in between the locks.
            if now < entry.expires_at {
                return Some(entry.descriptor.clone());
            }
            entries.remove(user_id);
        }
        None
    }

    /// Store `descriptor` for `ttl`, superseding any existing entry.
    pub fn insert(&self, user_id: impl Into<String>, descriptor: AvatarDescriptor, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            user_id.into(),
            CacheEntry {
                descriptor,
                expires_at,
            },
        );
    }

    /// Drop every entry past its expiry instant.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| now < entry.expires_at);
    }

    /// Number of resident entries, including any not yet lazily evicted.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
