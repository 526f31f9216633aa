use axum::{extract::State, Json};

use crate::error::{AppError, AppResult, ErrorDetail, HttpValidationError, LocItem};
use crate::models::{AskQueryRequest, AskQueryResponse};
use crate::state::AppState;
use crate::utils::ValidatedJson;

/// 用自然语言询问已登记的数据库
#[utoipa::path(
    post,
    path = "/ask",
    tag = "query",
    request_body = AskQueryRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Answer", body = AskQueryResponse),
        (status = 400, description = "No API key available", body = ErrorDetail),
        (status = 401, description = "Not authenticated", body = ErrorDetail),
        (status = 422, description = "Validation error", body = HttpValidationError),
        (status = 502, description = "LLM or target database failure", body = ErrorDetail)
    )
)]
pub async fn ask_question(
    State(app_state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AskQueryRequest>,
) -> AppResult<Json<AskQueryResponse>> {
    let registered = app_state.registry.list().await?;
    if !registered.contains(&req.db_name) {
        let msg = if registered.is_empty() {
            "Value error, no databases are registered".to_string()
        } else {
            format!(
                "Value error, db_name must be one of: {}",
                registered.join(", ")
            )
        };
        return Err(AppError::invalid_field(
            vec![LocItem::from("body"), LocItem::from("db_name")],
            msg,
            "value_error",
        ));
    }

    tracing::info!(db_name = %req.db_name, model = %req.model, "ask");
    let answer = app_state.ask_engine.ask(&req).await.map_err(|e| {
        tracing::error!(db_name = %req.db_name, "ask failed: {}", e);
        e
    })?;
    Ok(Json(AskQueryResponse { answer }))
}
