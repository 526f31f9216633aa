use crate::handlers::list_models;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn create_model_routes() -> Router<AppState> {
    Router::new().route("/models", get(list_models))
}
