use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheClient, CacheError};

/// Every this many writes, expired entries are purged from the whole map.
const SWEEP_INTERVAL: usize = 1024;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process store with per-entry expiry.
///
/// Expiry is measured on the tokio clock, so a paused runtime can advance
/// time deterministically. Expired entries are evicted when next read, and
/// swept periodically on write so keys that are never read again do not
/// accumulate.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time-to-live for `key`, or `None` if absent or expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.expires_at - now)
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let Some(entry) = self.entries.get(key) else {
                return Ok(None);
            };
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }

        // The read guard must be released before removing.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let now = Instant::now();
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.entries.retain(|_, entry| entry.expires_at > now);
            debug!(remaining = self.len(), "Swept expired cache entries");
        }

        let expires_at = now + Duration::from_secs(ttl_secs);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("ip:1.1.1.1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("ip:1.1.1.1", "1", 60).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("ip:1.1.1.1").await.unwrap(), Some("1".into()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("ip:1.1.1.1").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_expired_entries_are_swept_on_write() {
        let cache = MemoryCache::new();
        cache.set("ip:10.0.0.1", "1", 1).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        // The key above is never read again.
        for i in 1..SWEEP_INTERVAL {
            cache.set(&format!("ip:10.1.{}.{}", i / 256, i % 256), "1", 60).await.unwrap();
        }

        assert_eq!(cache.len(), SWEEP_INTERVAL - 1);
        assert_eq!(cache.ttl("ip:10.0.0.1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_ttl() {
        let cache = MemoryCache::new();
        cache.set("api_key:abc", "1", 10).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        cache.set("api_key:abc", "2", 10).await.unwrap();
        assert_eq!(cache.ttl("api_key:abc"), Some(Duration::from_secs(10)));
    }
}
