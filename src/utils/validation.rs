//! Extractors that deserialize then run `validator`, turning every failure into a 422.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{issues_from_validator, AppError, LocItem};

/// JSON 请求体 + 字段校验
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// 查询参数 + 字段校验
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value
            .validate()
            .map_err(|e| AppError::Validation(issues_from_validator("body", &e)))?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        value
            .validate()
            .map_err(|e| AppError::Validation(issues_from_validator("query", &e)))?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let body = vec![LocItem::from("body")];
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::invalid_field(body, "Field required", "missing")
        }
        JsonRejection::JsonDataError(e) => {
            let (loc, msg) = data_error_location(&e.body_text());
            AppError::invalid_field(loc, msg, "value_error")
        }
        other => AppError::invalid_field(body, other.body_text(), "json_invalid"),
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `items[0].name: invalid type: ...` 拆成 loc 与错误信息，根级错误只保留 `body`
fn data_error_location(body_text: &str) -> (Vec<LocItem>, String) {
    let detail = body_text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(body_text);
    let mut loc = vec![LocItem::from("body")];
    if let Some((path, msg)) = detail.split_once(": ") {
        if let Some(segments) = parse_field_path(path) {
            loc.extend(segments);
            return (loc, msg.to_string());
        }
    }
    (loc, detail.to_string())
}

fn parse_field_path(path: &str) -> Option<Vec<LocItem>> {
    let valid = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']');
    if path.is_empty() || !path.chars().all(valid) {
        return None;
    }
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut pieces = part.split('[');
        let key = pieces.next().unwrap_or_default();
        if !key.is_empty() {
            segments.push(LocItem::Key(key.to_string()));
        }
        for index in pieces {
            segments.push(LocItem::Index(index.strip_suffix(']')?.parse().ok()?));
        }
    }
    (!segments.is_empty()).then_some(segments)
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::invalid_field(vec![LocItem::from("query")], rejection.body_text(), "value_error")
}
