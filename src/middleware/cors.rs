use tower_http::cors::{Any, CorsLayer};

/// 允许任意来源调用，浏览器端通过 Authorization 头携带令牌
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
