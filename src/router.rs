use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    handlers,
    limiter::RateLimiter,
    middleware::{log_errors, rate_limit},
};

/// Builds the application with every route behind the admission gate.
pub fn create_router(limiter: Arc<RateLimiter>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http());

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding permissive CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router
}
