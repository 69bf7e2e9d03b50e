//! Question service routes

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use super::{
    handlers::post_questions,
    middleware::{AppState, cors_layer},
};

/// Create the question service router
///
/// `max_body_bytes` of 0 disables the request body limit.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let body_limit = if max_body_bytes == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(max_body_bytes)
    };

    Router::new()
        .route("/", post(post_questions))
        .route("/questions", post(post_questions))
        .layer(body_limit)
        .layer(cors_layer())
        .with_state(state)
}
