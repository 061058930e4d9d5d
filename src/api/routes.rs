//! Shared state and router construction for the HTTP proxy.
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::evaluation::invoker::Evaluator;

pub struct AppState {
    pub evaluator: Evaluator,
    /// Applies to both the multipart and the JSON endpoints.
    pub max_body_bytes: usize,
}

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/", get(handlers::root))
        .route("/evaluate", post(handlers::evaluate))
        .route("/compare", post(handlers::compare))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
