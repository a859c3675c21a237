//! Per-client request counting against an expiring cache.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::{CacheClient, rate_limit_key};
use crate::error::RateLimitError;
use crate::identity::{ClientClass, ClientIdentity};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} must be greater than zero")]
pub struct InvalidSettings(pub &'static str);

/// Limits and window length, fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    max_anonymous: u32,
    max_authenticated: u32,
    window_secs: u64,
}

impl RateLimitSettings {
    pub fn new(
        max_anonymous: u32,
        max_authenticated: u32,
        window_secs: u64,
    ) -> Result<Self, InvalidSettings> {
        if max_anonymous == 0 {
            return Err(InvalidSettings("max anonymous requests"));
        }
        if max_authenticated == 0 {
            return Err(InvalidSettings("max authenticated requests"));
        }
        if window_secs == 0 {
            return Err(InvalidSettings("window length"));
        }

        Ok(Self {
            max_anonymous,
            max_authenticated,
            window_secs,
        })
    }

    pub fn max_anonymous(&self) -> u32 {
        self.max_anonymous
    }

    pub fn max_authenticated(&self) -> u32 {
        self.max_authenticated
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decides whether a client may proceed.
///
/// Each allowed request rewrites the counter with a fresh full-window TTL, so
/// the window slides forward on every admission. Denied requests leave the
/// counter and its TTL untouched.
///
/// The read and the write are two separate cache calls. Concurrent requests
/// for the same client can read the same count and both write `count + 1`,
/// letting a burst briefly exceed the limit. Switching to an atomic increment
/// would also count denied requests, which this limiter does not do.
pub struct RateLimiter {
    settings: RateLimitSettings,
    cache: Arc<dyn CacheClient>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings, cache: Arc<dyn CacheClient>) -> Self {
        Self { settings, cache }
    }

    pub fn limit_for(&self, class: ClientClass) -> u32 {
        match class {
            ClientClass::Authenticated => self.settings.max_authenticated,
            ClientClass::Anonymous => self.settings.max_anonymous,
        }
    }

    pub async fn decide(&self, identity: &ClientIdentity) -> Result<Decision, RateLimitError> {
        let key = rate_limit_key(identity);
        let ttl = self.settings.window_secs;

        let value = self.cache.get(&key).await.map_err(|source| {
            error!(key = %key, error = %source, "Error fetching counter from cache");
            RateLimitError::Cache {
                key: key.clone(),
                source,
            }
        })?;

        let count = match value.as_deref() {
            None | Some("") => {
                self.store(&key, 1, ttl).await?;
                debug!(key = %key, count = 1, "First request in window");
                return Ok(Decision::Allow);
            }
            Some(raw) => raw.parse::<u64>().map_err(|source| {
                error!(key = %key, value = %raw, error = %source, "Error parsing counter");
                RateLimitError::Parse {
                    key: key.clone(),
                    value: raw.to_string(),
                    source,
                }
            })?,
        };

        // count + 1 > limit, without overflowing on a huge stored value.
        let limit = u64::from(self.limit_for(identity.class));
        if count >= limit {
            warn!(key = %key, count, limit, "Rate limit exceeded");
            return Ok(Decision::Deny);
        }

        self.store(&key, count + 1, ttl).await?;
        debug!(key = %key, count = count + 1, limit, "Request allowed");
        Ok(Decision::Allow)
    }

    async fn store(&self, key: &str, count: u64, ttl: u64) -> Result<(), RateLimitError> {
        self.cache
            .set(key, &count.to_string(), ttl)
            .await
            .map_err(|source| {
                error!(key = %key, error = %source, "Error updating counter in cache");
                RateLimitError::Cache {
                    key: key.to_string(),
                    source,
                }
            })
    }
}
