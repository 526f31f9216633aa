use crate::handlers::{create_database, delete_database, list_databases};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// 创建数据库登记路由
pub fn create_database_routes() -> Router<AppState> {
    Router::new()
        .route("/create_database", post(create_database))
        .route("/databases", get(list_databases))
        .route("/delete_database/{db_name}", delete(delete_database))
}
