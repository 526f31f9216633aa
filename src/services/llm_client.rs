use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmSettings;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, api_key: &str, model: &str, messages: &[ChatMessage])
        -> AppResult<String>;
}

/// OpenAI 兼容的 chat completions 客户端
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> AppResult<String> {
        let body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        debug!("OpenAI request: model={}, messages={}", model, messages.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("LLM request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let msg = extract_api_error(&body).unwrap_or_else(|| format!("HTTP {}", status));
            return Err(AppError::Upstream(format!("LLM request failed: {}", msg)));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid LLM response: {}", e)))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AppError::Upstream("LLM response has no content".to_string()))
    }
}

fn extract_api_error(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    // { "error": { "message": "..." } }
    parsed["error"]["message"].as_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let settings = LlmSettings {
            base_url: format!("{}/v1/", server.uri()),
            ..LlmSettings::default()
        };
        OpenAiClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  ANSWER: 42 \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server)
            .complete("sk-test", "gpt-4o-mini", &[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(answer, "ANSWER: 42");
    }

    #[tokio::test]
    async fn test_api_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("bad", "gpt-4", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("Incorrect API key provided")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("sk-test", "gpt-4", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
