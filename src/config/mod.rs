use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::limiter::{InvalidSettings, RateLimitSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error(transparent)]
    Limits(#[from] InvalidSettings),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_anonymous_requests: u32,
    pub max_authenticated_requests: u32,
    pub window_secs: u64,
    pub redis_host: String,
    pub redis_port: u16,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            max_anonymous_requests: positive(&lookup, "MAX_REQUESTS_WITHOUT_TOKEN_PER_SECOND")?,
            max_authenticated_requests: positive(&lookup, "MAX_REQUESTS_WITH_TOKEN_PER_SECOND")?,
            window_secs: positive(&lookup, "TIME_BLOCK_IN_SECOND")?,
            redis_host: required(&lookup, "REDIS_HOST")?,
            redis_port: required(&lookup, "REDIS_PORT")?,
            server_host: optional(&lookup, "SERVER_HOST")?.unwrap_or_else(|| "0.0.0.0".into()),
            server_port: optional(&lookup, "SERVER_PORT")?.unwrap_or(8080),
        })
    }

    pub fn limits(&self) -> Result<RateLimitSettings, ConfigError> {
        Ok(RateLimitSettings::new(
            self.max_anonymous_requests,
            self.max_authenticated_requests,
            self.window_secs,
        )?)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }
}

fn required<T, F>(lookup: &F, var: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var)?.ok_or(ConfigError::Missing(var))
}

fn positive<T, F>(lookup: &F, var: &'static str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    let value: T = required(lookup, var)?;
    if value == T::default() {
        return Err(ConfigError::NonPositive(var));
    }
    Ok(value)
}

fn optional<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}
