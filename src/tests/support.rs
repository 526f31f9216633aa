use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::config::{AuthSettings, PresetConnection, RegistrySettings, Settings};
use crate::error::AppResult;
use crate::models::AskQueryRequest;
use crate::routes::create_app;
use crate::services::{
    AskEngine, DatabaseRegistry, InMemoryConnectionRepository, InMemoryUserRepository,
    TokenService, UserService,
};
use crate::state::AppState;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const STUB_ANSWER: &str = "Existem 42 clientes.";

/// 记录收到的请求，不访问模型与数据库
#[derive(Default)]
pub struct RecordingEngine {
    pub requests: Mutex<Vec<AskQueryRequest>>,
}

#[async_trait]
impl AskEngine for RecordingEngine {
    async fn ask(&self, request: &AskQueryRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(STUB_ANSWER.to_string())
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<RecordingEngine>,
}

/// 内存存储 + 预置 "CRM Reports" + 初始管理员
pub async fn test_app() -> TestApp {
    let settings = Settings {
        auth: AuthSettings {
            token_ttl_minutes: 60,
            bootstrap_username: Some(ADMIN.to_string()),
            bootstrap_password: Some(ADMIN_PASSWORD.to_string()),
        },
        registry: RegistrySettings {
            presets: vec![PresetConnection {
                db_name: "CRM Reports".to_string(),
                server: "crm-db:3306".to_string(),
                database: "crm".to_string(),
                user: "reader".to_string(),
                password: "secret".to_string(),
            }],
            ..RegistrySettings::default()
        },
        ..Settings::default()
    };

    let token_service = Arc::new(TokenService::new(settings.auth.token_ttl_minutes));
    let user_service = Arc::new(UserService::new(
        Arc::new(InMemoryUserRepository::new()),
        token_service.clone(),
    ));
    user_service
        .ensure_bootstrap_user(&settings.auth)
        .await
        .unwrap();

    let registry = Arc::new(DatabaseRegistry::new(
        Arc::new(InMemoryConnectionRepository::new()),
        settings.registry.clone(),
    ));
    registry.seed_presets().await.unwrap();

    let engine = Arc::new(RecordingEngine::default());
    let state = AppState::new(
        Arc::new(settings),
        user_service,
        token_service,
        registry,
        engine.clone(),
    );

    TestApp {
        router: create_app(state),
        engine,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/login",
                None,
                serde_json::json!({"username": username, "password": password}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN, ADMIN_PASSWORD).await
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// `detail` 中每一项的 loc
pub fn detail_locs(body: &Value) -> Vec<Value> {
    body["detail"]
        .as_array()
        .map(|items| items.iter().map(|i| i["loc"].clone()).collect())
        .unwrap_or_default()
}
