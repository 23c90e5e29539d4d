//! Tagged read-through cache storage.
//!
//! Stores decoded CMS responses keyed by request path, each entry carrying
//! the set of tags it was fetched under. Entries live until a tag they carry
//! is purged or LRU capacity evicts them; there is no time-based expiry.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;
use serde_json::Value;

use super::keys::CacheTag;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone)]
struct Entry {
    tags: Vec<CacheTag>,
    body: Value,
}

/// Bounded cache of CMS responses with explicit tag-based purge.
pub struct TagCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl TagCache {
    /// Create a cache holding at most `capacity` responses.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Look up a stored response by request path.
    pub fn get(&self, path: &str) -> Option<Value> {
        let hit = rw_write(&self.entries, SOURCE, "get")
            .get(path)
            .map(|entry| entry.body.clone());
        if hit.is_some() {
            counter!("brezza_cache_hit_total").increment(1);
        } else {
            counter!("brezza_cache_miss_total").increment(1);
        }
        hit
    }

    /// Store a response under the given tags.
    pub fn put(&self, path: impl Into<String>, tags: &[CacheTag], body: Value) {
        let entry = Entry {
            tags: tags.to_vec(),
            body,
        };
        let evicted = rw_write(&self.entries, SOURCE, "put").push(path.into(), entry);
        if evicted.is_some() {
            counter!("brezza_cache_evict_total").increment(1);
        }
    }

    /// Drop every entry stored under `tag`. Returns the number removed.
    pub fn purge_tag(&self, tag: &CacheTag) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "purge_tag");
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.tags.contains(tag))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &stale {
            entries.pop(path);
        }
        counter!("brezza_cache_purge_total").increment(stale.len() as u64);
        stale.len()
    }

    /// Drop every entry.
    pub fn purge_all(&self) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "purge_all");
        let count = entries.len();
        entries.clear();
        counter!("brezza_cache_purge_total").increment(count as u64);
        count
    }

    /// Number of stored responses.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
