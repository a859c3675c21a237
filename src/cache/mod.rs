//! Expiring key-value store used to hold per-client request counters.

mod keys;
mod memory;
mod redis_cache;

use async_trait::async_trait;
use thiserror::Error;

pub use keys::rate_limit_key;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Backend(#[from] redis::RedisError),
}

/// Get/Set-with-TTL capability. No atomic increment is offered.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Returns `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` at `key`, replacing any previous expiry with `ttl_secs`.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;
}
