use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::error::{AppResult, ErrorDetail, HttpValidationError};
use crate::models::{
    AuthenticatedUser, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
    TokenResponse,
};
use crate::state::AppState;
use crate::utils::ValidatedJson;

/// 注册新用户（需要已登录）
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Username already registered", body = ErrorDetail),
        (status = 401, description = "Not authenticated", body = ErrorDetail),
        (status = 422, description = "Validation error", body = HttpValidationError)
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    app_state
        .user_service
        .register(&req.username, &req.password)
        .await?;
    tracing::info!(by = %current.username, username = %req.username, "register");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "User '{}' registered successfully.",
            req.username
        ))),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = ErrorDetail),
        (status = 422, description = "Validation error", body = HttpValidationError)
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = app_state
        .user_service
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// 重置密码，该用户已签发的令牌全部失效
#[utoipa::path(
    post,
    path = "/reset_password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorDetail),
        (status = 404, description = "Unknown user", body = ErrorDetail),
        (status = 422, description = "Validation error", body = HttpValidationError)
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    Extension(current): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    app_state
        .user_service
        .reset_password(&req.username, &req.password)
        .await?;
    tracing::info!(by = %current.username, username = %req.username, "reset_password");
    Ok(Json(MessageResponse::new(format!(
        "Password for '{}' reset successfully.",
        req.username
    ))))
}
