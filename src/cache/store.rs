//! Cache storage contract and in-process backends.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use time::OffsetDateTime;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key/value store with per-entry expiry.
///
/// `put_if_absent` never replaces a live entry: when two writers race on a
/// miss, the first one to land wins and the other result is dropped.
#[async_trait]
pub trait TtlCache<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    /// Live value for `key`. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError>;

    /// Store `value` unless a live entry exists. Returns whether it was stored.
    async fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError>;

    /// Whether writes can ever land. Callers skip the store step when not.
    fn accepts_writes(&self) -> bool {
        true
    }
}

struct MemoryEntry<V> {
    value: V,
    expires_at: OffsetDateTime,
}

impl<V> MemoryEntry<V> {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

/// Bounded in-process cache with LRU eviction.
pub struct MemoryTtlCache<V> {
    entries: RwLock<LruCache<String, MemoryEntry<V>>>,
}

impl<V> MemoryTtlCache<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "memory_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<V> TtlCache<V> for MemoryTtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let now = OffsetDateTime::now_utc();
        let mut entries = rw_write(&self.entries, SOURCE, "memory_get");

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        entries.pop(key);
        Ok(None)
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        let now = OffsetDateTime::now_utc();
        if expires_at <= now {
            return Ok(false);
        }

        let mut entries = rw_write(&self.entries, SOURCE, "memory_put_if_absent");
        if entries.peek(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }

        entries.put(key.to_string(), MemoryEntry { value, expires_at });
        Ok(true)
    }
}

/// Backend used when caching is switched off: every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl<V> TtlCache<V> for DisabledCache
where
    V: Send + Sync + 'static,
{
    async fn get(&self, _key: &str) -> Result<Option<V>, CacheError> {
        Ok(None)
    }

    async fn put_if_absent(
        &self,
        _key: &str,
        _value: V,
        _expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn accepts_writes(&self) -> bool {
        false
    }
}
