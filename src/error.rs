use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;

pub const RATE_LIMIT_MESSAGE: &str =
    "you have reached the maximum number of requests or actions allowed within a certain time frame";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Failures of the admission decision. None of these are retried.
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// Neither the forwarded header nor the connection yielded an address.
    #[error("client IP not found")]
    Identification,

    #[error("cache operation failed for key {key}: {source}")]
    Cache {
        key: String,
        #[source]
        source: CacheError,
    },

    /// The stored counter is not a decimal integer.
    #[error("invalid counter value {value:?} stored at key {key}: {source}")]
    Parse {
        key: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Responses the admission gate can short-circuit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    RateLimitExceeded,
    InternalServerError,
}

impl From<RateLimitError> for AppError {
    fn from(_: RateLimitError) -> Self {
        AppError::InternalServerError
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE),
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_internal_failure_maps_to_500() {
        let errors = [
            RateLimitError::Identification,
            RateLimitError::Cache {
                key: "ip:1.2.3.4".into(),
                source: CacheError::from(redis::RedisError::from((
                    redis::ErrorKind::IoError,
                    "connection refused",
                ))),
            },
            RateLimitError::Parse {
                key: "ip:1.2.3.4".into(),
                value: "x".into(),
                source: "x".parse::<u64>().unwrap_err(),
            },
        ];

        for err in errors {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_rate_limit_exceeded_is_429() {
        let response = AppError::RateLimitExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
