use axum::http::StatusCode;
use serde_json::json;

use super::support::*;

#[tokio::test]
async fn test_models_lists_allowed_set() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(empty_request("GET", "/models", Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!(["gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"])
    );
}

#[tokio::test]
async fn test_models_requires_token() {
    let app = test_app().await;
    let (status, _) = app.send(empty_request("GET", "/models", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_open_endpoints() {
    let app = test_app().await;

    let (status, body) = app.send(empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");

    let (status, body) = app.send(empty_request("GET", "/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/ask"].is_object());
}
