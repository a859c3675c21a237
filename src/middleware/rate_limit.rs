use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    cache::rate_limit_key,
    error::AppError,
    identity::identify_request,
    limiter::{Decision, RateLimiter},
};

/// Admission gate: identifies the caller, asks the limiter, and only runs
/// the inner handler on `Allow`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let identity = match identify_request(&req) {
        Ok(identity) => identity,
        Err(e) => {
            error!(error = %e, "Error extracting client IP");
            return AppError::InternalServerError.into_response();
        }
    };

    match limiter.decide(&identity).await {
        Ok(Decision::Allow) => next.run(req).await,
        // The limiter already logged the deny with its key.
        Ok(Decision::Deny) => AppError::RateLimitExceeded.into_response(),
        Err(e) => {
            error!(key = %rate_limit_key(&identity), error = %e, "Rate limit check failed");
            AppError::from(e).into_response()
        }
    }
}
