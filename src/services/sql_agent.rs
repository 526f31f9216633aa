//! Text-to-SQL loop behind `/ask`.
//!
//! The model is shown the schema of the target database and answers each turn
//! with either `SQL: <query>` (executed read-only, result fed back) or
//! `ANSWER: <text>` (returned to the caller).

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmSettings;
use crate::error::{AppError, AppResult};
use crate::models::AskQueryRequest;
use crate::services::sql_executor::render_schema;
use crate::services::{ChatMessage, DatabaseRegistry, LlmClient, SqlExecutor};
use crate::utils::sql_guard::ensure_read_only;

pub const FALLBACK_ANSWER: &str = "Could not obtain an answer for this question.";

#[async_trait]
pub trait AskEngine: Send + Sync {
    async fn ask(&self, request: &AskQueryRequest) -> AppResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
enum AgentStep {
    Query(String),
    Answer(String),
}

pub struct SqlAgent {
    registry: Arc<DatabaseRegistry>,
    llm: Arc<dyn LlmClient>,
    settings: LlmSettings,
}

impl SqlAgent {
    pub fn new(
        registry: Arc<DatabaseRegistry>,
        llm: Arc<dyn LlmClient>,
        settings: LlmSettings,
    ) -> Self {
        Self {
            registry,
            llm,
            settings,
        }
    }

    /// 请求中的 key 优先，其次是服务端配置
    fn resolve_api_key(&self, requested: Option<&str>) -> AppResult<String> {
        requested
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.settings.api_key.as_deref())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::BadRequest(
                    "No OpenAI API key available: pass api_key or configure OPENAI_API_KEY"
                        .to_string(),
                )
            })
    }

    pub async fn answer_with(
        &self,
        executor: &dyn SqlExecutor,
        db_name: &str,
        question: &str,
        model: &str,
        api_key: &str,
    ) -> AppResult<String> {
        let schema = executor.schema().await?;
        let mut messages = vec![
            ChatMessage::system(system_prompt(
                db_name,
                &self.settings.answer_language,
                &render_schema(&schema),
            )),
            ChatMessage::user(question),
        ];

        for step in 1..=self.settings.max_steps {
            let reply = self.llm.complete(api_key, model, &messages).await?;
            messages.push(ChatMessage::assistant(reply.clone()));

            match parse_reply(&reply) {
                AgentStep::Answer(answer) if !answer.is_empty() => {
                    tracing::info!(db_name = %db_name, step, "question answered");
                    return Ok(answer);
                }
                AgentStep::Answer(_) => {
                    messages.push(ChatMessage::user(
                        "Your reply was empty. Reply with SQL: <query> or ANSWER: <text>.",
                    ));
                }
                AgentStep::Query(sql) => {
                    let feedback = match ensure_read_only(&sql) {
                        Err(rejection) => {
                            tracing::warn!(db_name = %db_name, step, "query rejected: {}", rejection);
                            format!(
                                "Query rejected: {}. You only have read permission (SELECT).",
                                rejection
                            )
                        }
                        Ok(statement) => {
                            tracing::debug!(db_name = %db_name, step, sql = %statement, "running query");
                            match executor.run(&statement, self.registry.row_limit()).await {
                                Ok(output) => format!("Query result:\n{}", output.render()),
                                Err(e) => format!("Query failed: {}", e),
                            }
                        }
                    };
                    messages.push(ChatMessage::user(feedback));
                }
            }
        }

        tracing::warn!(db_name = %db_name, "step budget exhausted");
        Ok(FALLBACK_ANSWER.to_string())
    }
}

#[async_trait]
impl AskEngine for SqlAgent {
    async fn ask(&self, request: &AskQueryRequest) -> AppResult<String> {
        let api_key = self.resolve_api_key(request.api_key.as_deref())?;
        let executor = self.registry.executor_for(&request.db_name).await?;
        self.answer_with(
            executor.as_ref(),
            &request.db_name,
            &request.question,
            &request.model,
            &api_key,
        )
        .await
    }
}

fn system_prompt(db_name: &str, language: &str, schema: &str) -> String {
    format!(
        r#"You are an assistant specialised in SQL queries for the database "{db_name}", but you can also chat about other topics.

Important guidelines:
1. Build efficient and concise SQL queries when needed.
2. If the question is not related to the data, answer as a chat assistant without writing a query.
3. Write each SQL query on a single line.
4. Use single quotes for strings in queries.
5. You only have read permission (SELECT).
6. Format the final answer in a friendly way, in {language}, without the SQL query.
7. Do NOT show the SQL query in the final answer, only the results.
8. Do NOT explain your reasoning in the final answer.
9. If the question is unclear, ask for clarification.
10. Consider the context of previous messages when building a query or answer.
11. If asked which database you are connected to, do not list the tables. Only give the database name.
12. For math questions, do the calculations and check the result before answering.
13. If the user's calculation is wrong, correct it and explain the correction briefly.
14. Always give specific, factual answers and avoid assumptions.

Protocol:
- To run a query, reply with exactly one line: SQL: <query>
- When you have the final answer, reply with: ANSWER: <text>

Schema of "{db_name}":
{schema}"#
    )
}

fn parse_reply(reply: &str) -> AgentStep {
    let reply = reply.trim();

    if let Some(sql) = fenced_sql(reply) {
        return AgentStep::Query(sql);
    }

    if let Some(sql) = strip_prefix_ignore_case(reply, "SQL:") {
        return AgentStep::Query(sql.trim().to_string());
    }
    if let Some(answer) = strip_prefix_ignore_case(reply, "ANSWER:") {
        return AgentStep::Answer(answer.trim().to_string());
    }
    AgentStep::Answer(reply.to_string())
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn fenced_sql(reply: &str) -> Option<String> {
    let start = reply.find("```sql")? + "```sql".len();
    let body = &reply[start..];
    let end = body.find("```")?;
    let sql = body[..end].trim();
    (!sql.is_empty()).then(|| sql.to_string())
}
