//! HTTP admission control: per-client request limits backed by an expiring
//! key-value store.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod middleware;
pub mod router;

pub use limiter::{Decision, RateLimitSettings, RateLimiter};
