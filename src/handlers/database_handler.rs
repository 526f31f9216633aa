use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppResult, ErrorDetail, HttpValidationError};
use crate::models::{CreateDatabaseParams, MessageResponse};
use crate::state::AppState;
use crate::utils::ValidatedQuery;

/// 登记新的数据库连接，参数通过查询字符串传入
#[utoipa::path(
    post,
    path = "/create_database",
    tag = "databases",
    params(CreateDatabaseParams),
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Database registered", body = MessageResponse),
        (status = 400, description = "Duplicate name or invalid server", body = ErrorDetail),
        (status = 401, description = "Not authenticated", body = ErrorDetail),
        (status = 422, description = "Validation error", body = HttpValidationError)
    )
)]
pub async fn create_database(
    State(app_state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<CreateDatabaseParams>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let message = app_state.registry.create(params.into_connection()).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))))
}

#[utoipa::path(
    get,
    path = "/databases",
    tag = "databases",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Registered database names", body = Vec<String>),
        (status = 401, description = "Not authenticated", body = ErrorDetail)
    )
)]
pub async fn list_databases(State(app_state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(app_state.registry.list().await?))
}

#[utoipa::path(
    delete,
    path = "/delete_database/{db_name}",
    tag = "databases",
    params(("db_name" = String, Path, description = "Registered database name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Database removed", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorDetail),
        (status = 404, description = "Unknown database", body = ErrorDetail)
    )
)]
pub async fn delete_database(
    State(app_state): State<AppState>,
    Path(db_name): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let message = app_state.registry.delete(&db_name).await?;
    Ok(Json(MessageResponse::new(message)))
}
