use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// 用户与连接登记的存储库。`url` 为空时使用内存存储
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "***"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct AuthSettings {
    pub token_ttl_minutes: i64,
    pub bootstrap_username: Option<String>,
    pub bootstrap_password: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 24 * 60,
            bootstrap_username: None,
            bootstrap_password: None,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bootstrap_username", &self.bootstrap_username)
            .finish_non_exhaustive()
    }
}

/// OpenAI 兼容接口配置
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 单次提问允许的最大推理轮数
    pub max_steps: usize,
    pub request_timeout_secs: u64,
    pub answer_language: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 1024,
            max_steps: 6,
            request_timeout_secs: 60,
            answer_language: "Brazilian Portuguese".to_string(),
        }
    }
}

// api_key must never reach the logs, so Debug is written by hand.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_steps", &self.max_steps)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("answer_language", &self.answer_language)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegistrySettings {
    /// 目前只支持 mysql
    pub driver: String,
    pub row_limit: usize,
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub presets: Vec<PresetConnection>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            driver: "mysql".to_string(),
            row_limit: 50,
            connect_timeout_secs: 10,
            presets: Vec::new(),
        }
    }
}

/// 启动时预先登记的数据库连接
#[derive(Deserialize, Clone)]
pub struct PresetConnection {
    pub db_name: String,
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for PresetConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetConnection")
            .field("db_name", &self.db_name)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(File::with_name("config/local").required(false))
            // Eg. `APP_LLM__API_KEY=sk-... ./target/ask-gateway`
            .add_source(Environment::with_prefix("app").separator("__"))
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.apply_env_fallbacks();
        Ok(settings)
    }

    /// 未显式配置 llm.api_key 时回退到 OPENAI_API_KEY
    fn apply_env_fallbacks(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
