use tower_http::cors::{Any, CorsLayer};

/// The back office and the public careers page are served from other origins.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}
