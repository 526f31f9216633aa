use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::llm_model::{default_model, validate_model};

pub const DEFAULT_DB_NAME: &str = "CRM Reports";

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

/// `/ask` 请求体
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AskQueryRequest {
    #[serde(default)]
    #[schema(required = true)]
    #[validate(length(min = 1, code = "missing", message = "Field required"))]
    pub question: String,
    /// 已登记的数据库名称
    #[serde(default = "default_db_name")]
    #[schema(default = "CRM Reports")]
    pub db_name: String,
    #[serde(default = "default_model")]
    #[schema(default = "gpt-4o-mini", pattern = "^(gpt-4o-mini|gpt-4-turbo|gpt-4|gpt-3.5-turbo)$")]
    #[validate(custom(function = "validate_model"))]
    pub model: String,
    /// 覆盖服务端配置的 OpenAI key
    #[serde(default)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AskQueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskQueryRequest")
            .field("question", &self.question)
            .field("db_name", &self.db_name)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AskQueryResponse {
    pub answer: String,
}
