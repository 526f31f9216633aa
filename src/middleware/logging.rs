use axum::{body::Body, http::Request, middleware::Next, response::IntoResponse};
use std::time::Instant;
use tracing::{debug, error, info};

const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "cookie", "x-api-key"];

/// 记录每个请求的方法、路径、状态码与耗时
pub async fn log_requests(req: Request<Body>, next: Next) -> impl IntoResponse {
    let method = req.method().clone();
    // Path only: /create_database carries credentials in its query string
    let path = req.uri().path().to_string();
    let started = Instant::now();

    info!("Incoming request: {} {}", method, path);

    for (name, value) in req.headers().iter() {
        if SENSITIVE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        match value.to_str() {
            Ok(value_str) => debug!("Header: {}: {}", name, value_str),
            Err(_) => debug!("Header: {}: (binary data)", name),
        }
    }

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    info!("Response status for {} {}: {} ({} ms)", method, path, status, elapsed_ms);

    if status.is_server_error() {
        error!("Error response for {} {}: {}", method, path, status);
    } else if status.is_client_error() {
        debug!("Client error for {} {}: {}", method, path, status);
    }

    response
}
