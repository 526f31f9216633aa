use crate::handlers::{login, register, reset_password};
use crate::state::AppState;
use axum::{routing::post, Router};

/// 需要令牌的账号路由
pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/reset_password", post(reset_password))
}

/// 登录路由，无需令牌
pub fn create_login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
