use axum::Json;

use crate::error::ErrorDetail;
use crate::models::available_models;

#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Supported model identifiers", body = Vec<String>),
        (status = 401, description = "Not authenticated", body = ErrorDetail)
    )
)]
pub async fn list_models() -> Json<Vec<String>> {
    Json(available_models())
}
