use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// 存储中的用户记录
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 通过 Bearer 校验后挂在请求扩展上的当前用户
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "register_passwords_match"))]
pub struct RegisterRequest {
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub username: String,
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub password: String,
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub username: String,
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "reset_passwords_match"))]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub username: String,
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub password: String,
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub confirm_password: String,
}

fn register_passwords_match(req: &RegisterRequest) -> Result<(), ValidationError> {
    confirmation_matches(&req.password, &req.confirm_password)
}

fn reset_passwords_match(req: &ResetPasswordRequest) -> Result<(), ValidationError> {
    confirmation_matches(&req.password, &req.confirm_password)
}

fn confirmation_matches(password: &str, confirm_password: &str) -> Result<(), ValidationError> {
    if password == confirm_password {
        return Ok(());
    }
    let mut error = ValidationError::new("value_error");
    error.message = Some(Cow::from("Value error, passwords do not match"));
    error.add_param(Cow::from("field"), &"confirm_password");
    Err(error)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

/// 通用的 `{"message": "..."}` 响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
