use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("request validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// 单字段校验失败
    pub fn invalid_field(
        loc: Vec<LocItem>,
        msg: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        AppError::Validation(vec![ValidationIssue {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One entry of the 422 `detail` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub loc: Vec<LocItem>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LocItem {
    Key(String),
    Index(usize),
}

impl From<&str> for LocItem {
    fn from(value: &str) -> Self {
        LocItem::Key(value.to_string())
    }
}

/// 422 响应体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HttpValidationError {
    pub detail: Vec<ValidationIssue>,
}

/// 其他错误的响应体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Flattens `validator` output into `detail` entries located under `source`
/// ("body" or "query"). Struct-level errors may carry a `field` param naming
/// the field they belong to.
pub fn issues_from_validator(source: &str, errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let target = error
                .params
                .get("field")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| field.to_string());

            let mut loc = vec![LocItem::from(source)];
            if target != "__all__" {
                loc.push(LocItem::Key(target));
            }

            issues.push(ValidationIssue {
                loc,
                msg: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
                kind: error.code.to_string(),
            });
        }
    }
    // HashMap order is unstable
    issues.sort_by(|a, b| format!("{:?}", a.loc).cmp(&format!("{:?}", b.loc)));
    issues
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::Validation(detail) => {
                (status, Json(HttpValidationError { detail })).into_response()
            }
            AppError::Unauthorized(msg) => (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "detail": msg })),
            )
                .into_response(),
            AppError::Db(e) => {
                tracing::error!("database error: {}", e);
                (status, Json(json!({ "detail": "Internal database error" }))).into_response()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!("{}", other);
                }
                (status, Json(json!({ "detail": other.to_string() }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use validator::ValidationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_issue_serializes_with_type_key() {
        let issue = ValidationIssue {
            loc: vec![LocItem::from("body"), LocItem::Index(0)],
            msg: "Field required".to_string(),
            kind: "missing".to_string(),
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["loc"], json!(["body", 0]));
        assert_eq!(value["type"], "missing");
    }

    #[test]
    fn test_struct_level_error_uses_field_param() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("value_error");
        error.message = Some(Cow::from("Passwords do not match"));
        error.add_param(Cow::from("field"), &"confirm_password");
        errors.add("__all__", error);

        let issues = issues_from_validator("body", &errors);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].loc,
            vec![LocItem::from("body"), LocItem::from("confirm_password")]
        );
        assert_eq!(issues[0].kind, "value_error");
    }
}
