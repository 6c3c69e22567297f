use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A cached GET response body
#[derive(Clone, Debug, PartialEq)]
pub struct CachedEntry {
    pub body: Value,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct Slot {
    entry: CachedEntry,
    stored_at: Instant,
}

/// Response cache keyed by request path, with TTL
///
/// Passed explicitly to the clients that use it; writes invalidate the keys
/// they make stale.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, Slot>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get an entry if present and not expired
    pub fn get(&self, key: &str) -> Option<CachedEntry> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(slot) if slot.stored_at.elapsed() < self.ttl => return Some(slot.entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.evict_if_expired(key)
    }

    // The entry may have been refreshed since the read lock was released
    fn evict_if_expired(&self, key: &str) -> Option<CachedEntry> {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(slot) if slot.stored_at.elapsed() < self.ttl => Some(slot.entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, body: Value) {
        let slot = Slot {
            entry: CachedEntry {
                body,
                fetched_at: Utc::now(),
            },
            stored_at: Instant::now(),
        };
        self.entries.write().insert(key.into(), slot);
    }

    /// Drop one key; returns whether it was cached
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every key starting with `prefix`; returns how many were dropped
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear_expired(&self) {
        let ttl = self.ttl;
        self.entries.write().retain(|_, slot| slot.stored_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
