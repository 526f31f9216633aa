use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{AppError, AppResult};
use crate::models::{DatabaseConnection, DbPool};

/// 已登记数据库连接的存储
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Fails with `BadRequest` when `db_name` is already registered.
    async fn insert(&self, connection: &DatabaseConnection) -> AppResult<()>;

    async fn get(&self, db_name: &str) -> AppResult<Option<DatabaseConnection>>;

    /// Sorted by `db_name`.
    async fn names(&self) -> AppResult<Vec<String>>;

    /// Returns `false` when nothing was removed.
    async fn delete(&self, db_name: &str) -> AppResult<bool>;
}

pub(crate) fn duplicate_db_name(db_name: &str) -> AppError {
    AppError::BadRequest(format!(
        "A database named '{}' is already registered",
        db_name
    ))
}

pub struct MySqlConnectionRepository {
    pool: DbPool,
}

impl MySqlConnectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for MySqlConnectionRepository {
    async fn insert(&self, connection: &DatabaseConnection) -> AppResult<()> {
        let result = sqlx::query(
            r#"
                INSERT INTO database_connections (db_name, server, database_name, username, password, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
        )
        .bind(&connection.db_name)
        .bind(&connection.server)
        .bind(&connection.database)
        .bind(&connection.user)
        .bind(&connection.password)
        .bind(connection.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(duplicate_db_name(&connection.db_name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, db_name: &str) -> AppResult<Option<DatabaseConnection>> {
        let connection = sqlx::query_as::<_, DatabaseConnection>(
            "SELECT db_name, server, database_name, username, password, created_at FROM database_connections WHERE db_name = ?",
        )
        .bind(db_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(connection)
    }

    async fn names(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT db_name FROM database_connections ORDER BY db_name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn delete(&self, db_name: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM database_connections WHERE db_name = ?")
            .bind(db_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct InMemoryConnectionRepository {
    connections: DashMap<String, DatabaseConnection>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn insert(&self, connection: &DatabaseConnection) -> AppResult<()> {
        match self.connections.entry(connection.db_name.clone()) {
            Entry::Occupied(_) => Err(duplicate_db_name(&connection.db_name)),
            Entry::Vacant(slot) => {
                slot.insert(connection.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, db_name: &str) -> AppResult<Option<DatabaseConnection>> {
        Ok(self.connections.get(db_name).map(|c| c.value().clone()))
    }

    async fn names(&self) -> AppResult<Vec<String>> {
        let mut names: Vec<String> = self.connections.iter().map(|c| c.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, db_name: &str) -> AppResult<bool> {
        Ok(self.connections.remove(db_name).is_some())
    }
}
