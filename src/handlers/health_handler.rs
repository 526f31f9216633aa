use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn get_api_health(State(app_state): State<AppState>) -> Json<Value> {
    let store = if app_state.settings.database.url.is_some() {
        "mysql"
    } else {
        "memory"
    };
    Json(json!({
        "status": "healthy",
        "store": store,
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": app_state.token_service.active_sessions(),
    }))
}
