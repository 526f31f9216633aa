use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

/// 查询结果，单元格统一转成文本交给模型
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub truncated: bool,
}

impl QueryOutput {
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "(no rows)".to_string();
        }
        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        if self.truncated {
            out.push_str(&format!("\n(truncated to {} rows)", self.rows.len()));
        }
        out
    }
}

/// Schema introspection and read-only query execution against one registered database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn schema(&self) -> AppResult<Vec<TableSchema>>;

    async fn run(&self, sql: &str, row_limit: usize) -> AppResult<QueryOutput>;
}

pub fn render_schema(tables: &[TableSchema]) -> String {
    tables
        .iter()
        .map(|t| {
            let columns = t
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {}({})", t.name, columns)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn schema(&self) -> AppResult<Vec<TableSchema>> {
        // information_schema 的列在 MySQL 8 下可能按二进制返回，这里统一 CAST
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"SELECT CAST(table_name AS CHAR), CAST(column_name AS CHAR), CAST(column_type AS CHAR)
               FROM information_schema.columns
               WHERE table_schema = DATABASE()
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to read schema: {}", e)))?;

        let mut tables: Vec<TableSchema> = Vec::new();
        for (table, column, data_type) in rows {
            let column = ColumnSchema {
                name: column,
                data_type,
            };
            match tables.last_mut() {
                Some(last) if last.name == table => last.columns.push(column),
                _ => tables.push(TableSchema {
                    name: table,
                    columns: vec![column],
                }),
            }
        }
        Ok(tables)
    }

    async fn run(&self, sql: &str, row_limit: usize) -> AppResult<QueryOutput> {
        let mut stream = sqlx::query(sql).fetch(&self.pool);
        let mut output = QueryOutput::default();

        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| AppError::Upstream(format!("Query failed: {}", e)))?
        {
            if output.columns.is_empty() {
                output.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
            }
            if output.rows.len() >= row_limit {
                output.truncated = true;
                break;
            }
            output.rows.push(render_row(&row));
        }
        Ok(output)
    }
}

fn render_row(row: &MySqlRow) -> Vec<String> {
    (0..row.columns().len())
        .map(|idx| render_cell(row, idx))
        .collect()
}

fn render_cell(row: &MySqlRow, idx: usize) -> String {
    fn text<T: ToString>(v: Option<T>) -> String {
        v.map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string())
    }

    // Unsigned first for BIGINT UNSIGNED columns
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<rust_decimal::Decimal>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return text(v);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return text(v.map(|dt| dt.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return text(v.map(|d| d.format("%Y-%m-%d")));
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
        return text(v.map(|t| t.format("%H:%M:%S")));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return text(v.map(|b| String::from_utf8_lossy(&b).into_owned()));
    }
    "NULL".to_string()
}
