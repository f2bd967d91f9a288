//! In-process [`Casher`] backed by a bounded `quick_cache`.
//!
//! Entries beyond the capacity are evicted by the cache's own policy; readers
//! fall back to the repository on a miss, so eviction is never an error.

use std::sync::atomic::{AtomicBool, Ordering};

use answer_core::{Casher, Closer, Healther};
use async_trait::async_trait;
use bytes::Bytes;
use quick_cache::sync::Cache;

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

pub struct MemoryCache {
    entries: Cache<String, Bytes>,
    closed: AtomicBool,
}

impl MemoryCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity.max(1)),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> anyhow::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            anyhow::bail!("cache is closed");
        }
        Ok(())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl Casher for MemoryCache {
    async fn write(&self, key: &str, payload: Bytes) -> anyhow::Result<()> {
        self.ensure_open()?;
        self.entries.insert(key.to_string(), payload);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.ensure_open()?;
        self.entries.remove(key);
        Ok(())
    }
}

impl Healther for MemoryCache {
    fn is_healthy(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Closer for MemoryCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_get_delete() {
        let cache = MemoryCache::new(16);

        cache.write("answer:1", Bytes::from_static(b"{}")).await.unwrap();
        assert_eq!(cache.get("answer:1"), Some(Bytes::from_static(b"{}")));

        cache.delete("answer:1").await.unwrap();
        assert!(cache.get("answer:1").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn write_replaces_previous_value() {
        let cache = MemoryCache::new(16);
        cache.write("k", Bytes::from_static(b"1")).await.unwrap();
        cache.write("k", Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(cache.get("k"), Some(Bytes::from_static(b"2")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn deleting_absent_key_succeeds() {
        let cache = MemoryCache::new(16);
        assert!(cache.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn closed_cache_rejects_calls_and_reports_unhealthy() {
        let cache = MemoryCache::new(16);
        cache.write("k", Bytes::from_static(b"1")).await.unwrap();
        assert!(cache.is_healthy());

        cache.close().await.unwrap();

        assert!(!cache.is_healthy());
        assert!(cache.is_empty());
        assert!(cache.write("k", Bytes::new()).await.is_err());
        assert!(cache.delete("k").await.is_err());
    }
}
