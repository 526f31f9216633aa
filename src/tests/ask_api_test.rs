use axum::http::StatusCode;
use serde_json::json;

use super::support::*;

#[tokio::test]
async fn test_ask_applies_defaults() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/ask",
            Some(&token),
            json!({"question": "Quantos clientes temos?"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"answer": STUB_ANSWER}));

    let requests = app.engine.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].db_name, "CRM Reports");
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert!(requests[0].api_key.is_none());
}

#[tokio::test]
async fn test_ask_unknown_model_is_422() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/ask",
            Some(&token),
            json!({"question": "hi", "model": "gpt-5"}),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_locs(&body), vec![json!(["body", "model"])]);
    assert_eq!(body["detail"][0]["type"], "string_pattern_mismatch");
    assert!(app.engine.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ask_missing_question_is_422() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(json_request("POST", "/ask", Some(&token), json!({"model": "gpt-4"})))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_locs(&body), vec![json!(["body", "question"])]);
}

#[tokio::test]
async fn test_ask_unregistered_db_is_422() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/ask",
            Some(&token),
            json!({"question": "hi", "db_name": "Finance"}),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_locs(&body), vec![json!(["body", "db_name"])]);
    assert!(body["detail"][0]["msg"]
        .as_str()
        .unwrap()
        .contains("CRM Reports"));
}

#[tokio::test]
async fn test_ask_forwards_explicit_fields() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/ask",
            Some(&token),
            json!({
                "question": "Total de vendas?",
                "db_name": "CRM Reports",
                "model": "gpt-4-turbo",
                "api_key": "sk-client"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let requests = app.engine.requests.lock().unwrap();
    assert_eq!(requests[0].model, "gpt-4-turbo");
    assert_eq!(requests[0].api_key.as_deref(), Some("sk-client"));
}

#[tokio::test]
async fn test_ask_requires_token() {
    let app = test_app().await;
    let (status, _) = app
        .send(json_request("POST", "/ask", None, json!({"question": "hi"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
