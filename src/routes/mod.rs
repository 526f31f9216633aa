pub mod ask_routes;
pub mod auth_routes;
pub mod database_routes;
pub mod docs_routes;
pub mod health_routes;
pub mod model_routes;

pub use ask_routes::*;
pub use auth_routes::*;
pub use database_routes::*;
pub use docs_routes::*;
pub use health_routes::*;
pub use model_routes::*;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors_layer, log_requests, require_bearer};
use crate::state::AppState;

/// 组装完整应用：除登录、健康检查与文档外都需要 Bearer 令牌
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(create_auth_routes())
        .merge(create_database_routes())
        .merge(create_model_routes())
        .merge(create_ask_routes())
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(protected)
        .merge(create_login_routes())
        .merge(create_health_routes())
        .merge(create_docs_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(from_fn(log_requests)),
        )
        .with_state(state)
}
