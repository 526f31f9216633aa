use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// 校验 Bearer 令牌，并把 `AuthenticatedUser` 放进请求扩展
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    let user = state.token_service.authenticate(token)?;

    tracing::debug!(username = %user.username, "request authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Scheme match is case-insensitive.
pub fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
