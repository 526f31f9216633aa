use crate::handlers::ask_question;
use crate::state::AppState;
use axum::{routing::post, Router};

/// 创建自然语言查询路由
pub fn create_ask_routes() -> Router<AppState> {
    Router::new().route("/ask", post(ask_question))
}
