use axum::http::StatusCode;
use serde_json::json;

use super::support::*;

const SALES_QUERY: &str =
    "/create_database?db_name=Sales&server=sales-db%3A3306&database=sales&user=reader&password=p%40ss";

#[tokio::test]
async fn test_databases_reflect_create_and_delete() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(empty_request("GET", "/databases", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["CRM Reports"]));

    let (status, body) = app
        .send(empty_request("POST", SALES_QUERY, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Database 'Sales' registered successfully.");

    let (_, body) = app
        .send(empty_request("GET", "/databases", Some(&token)))
        .await;
    assert_eq!(body, json!(["CRM Reports", "Sales"]));

    let (status, body) = app
        .send(empty_request("DELETE", "/delete_database/Sales", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Sales"));

    let (_, body) = app
        .send(empty_request("GET", "/databases", Some(&token)))
        .await;
    assert_eq!(body, json!(["CRM Reports"]));
}

#[tokio::test]
async fn test_delete_name_with_space() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, _) = app
        .send(empty_request(
            "DELETE",
            "/delete_database/CRM%20Reports",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(empty_request("GET", "/databases", Some(&token)))
        .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_missing_params_is_422() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(empty_request(
            "POST",
            "/create_database?db_name=Sales&database=sales",
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        detail_locs(&body),
        vec![
            json!(["query", "password"]),
            json!(["query", "server"]),
            json!(["query", "user"]),
        ]
    );
}

#[tokio::test]
async fn test_create_duplicate_is_400() {
    let app = test_app().await;
    let token = app.admin_token().await;

    app.send(empty_request("POST", SALES_QUERY, Some(&token)))
        .await;
    let (status, body) = app
        .send(empty_request("POST", SALES_QUERY, Some(&token)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "A database named 'Sales' is already registered");
}

#[tokio::test]
async fn test_delete_unknown_is_404() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, _) = app
        .send(empty_request("DELETE", "/delete_database/Nope", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registry_requires_token() {
    let app = test_app().await;

    let (status, _) = app.send(empty_request("GET", "/databases", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(empty_request("POST", SALES_QUERY, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_blank_name_is_422() {
    let app = test_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(empty_request(
            "POST",
            "/create_database?db_name=%20%20&server=h%3A3306&database=sales&user=reader&password=pw",
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_locs(&body), vec![json!(["query", "db_name"])]);
    assert_eq!(body["detail"][0]["type"], "missing");

    let (_, body) = app
        .send(empty_request("GET", "/databases", Some(&token)))
        .await;
    assert_eq!(body, json!(["CRM Reports"]));
}
