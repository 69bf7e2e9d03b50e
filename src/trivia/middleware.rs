//! Shared state and layers of the question service

use std::sync::Arc;

use crate::bedrock::provider::BedrockProvider;

/// Application shared state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<BedrockProvider>,
}

impl AppState {
    pub fn new(provider: BedrockProvider) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

/// CORS layer
///
/// The browser front-end is served from a different origin, so every origin,
/// method and header is allowed.
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
