use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};

use super::{CacheClient, CacheError};

/// Redis-backed counter store.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SET key value EX ttl
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a reachable server, e.g. REDIS_URL=redis://127.0.0.1:6379/
    #[tokio::test]
    #[ignore]
    async fn test_set_then_get_against_live_redis() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());
        let cache = RedisCache::connect(&url).await.unwrap();

        cache.set("ip:test-roundtrip", "3", 5).await.unwrap();
        assert_eq!(
            cache.get("ip:test-roundtrip").await.unwrap(),
            Some("3".to_string())
        );
        assert_eq!(cache.get("ip:test-missing-key").await.unwrap(), None);
    }
}
