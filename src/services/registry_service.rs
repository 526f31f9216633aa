use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::RegistrySettings;
use crate::error::{AppError, AppResult};
use crate::models::DatabaseConnection;
use crate::services::{ConnectionRepository, MySqlExecutor, SqlExecutor};

/// 连接池与建池时使用的连接串
struct CachedPool {
    url: Url,
    pool: MySqlPool,
}

/// 外部数据库登记表，并缓存每个库的连接池
pub struct DatabaseRegistry {
    repository: Arc<dyn ConnectionRepository>,
    pools: DashMap<String, CachedPool>,
    settings: RegistrySettings,
}

impl DatabaseRegistry {
    pub fn new(repository: Arc<dyn ConnectionRepository>, settings: RegistrySettings) -> Self {
        Self {
            repository,
            pools: DashMap::new(),
            settings,
        }
    }

    pub fn row_limit(&self) -> usize {
        self.settings.row_limit
    }

    pub async fn create(&self, connection: DatabaseConnection) -> AppResult<String> {
        // Reject an unusable server string before it is stored
        connection.connection_url(&self.settings.driver)?;
        self.repository.insert(&connection).await?;
        tracing::info!(
            db_name = %connection.db_name,
            server = %connection.server,
            database = %connection.database,
            "database registered"
        );
        Ok(format!(
            "Database '{}' registered successfully.",
            connection.db_name
        ))
    }

    pub async fn list(&self) -> AppResult<Vec<String>> {
        self.repository.names().await
    }

    pub async fn delete(&self, db_name: &str) -> AppResult<String> {
        if !self.repository.delete(db_name).await? {
            return Err(AppError::NotFound(format!(
                "Database '{}' not found",
                db_name
            )));
        }
        if let Some((_, cached)) = self.pools.remove(db_name) {
            cached.pool.close().await;
        }
        tracing::info!(db_name = %db_name, "database removed");
        Ok(format!("Database '{}' removed successfully.", db_name))
    }

    pub async fn exists(&self, db_name: &str) -> AppResult<bool> {
        Ok(self.repository.get(db_name).await?.is_some())
    }

    /// 启动时登记配置中的预置连接，已存在的跳过
    pub async fn seed_presets(&self) -> AppResult<usize> {
        let mut seeded = 0;
        for preset in self.settings.presets.clone() {
            if self.exists(&preset.db_name).await? {
                tracing::debug!(db_name = %preset.db_name, "preset already registered");
                continue;
            }
            match self.create(preset.into()).await {
                Ok(_) => seeded += 1,
                Err(AppError::BadRequest(msg)) => tracing::warn!("skipping preset: {}", msg),
                Err(e) => return Err(e),
            }
        }
        Ok(seeded)
    }

    pub async fn executor_for(&self, db_name: &str) -> AppResult<Arc<dyn SqlExecutor>> {
        let pool = self.pool_for(db_name).await?;
        Ok(Arc::new(MySqlExecutor::new(pool)))
    }

    /// 每次都按当前登记解析连接串，缓存的池只有连接串一致时才复用
    async fn pool_for(&self, db_name: &str) -> AppResult<MySqlPool> {
        let url = self.current_url(db_name).await?.ok_or_else(|| not_found(db_name))?;

        if let Some(cached) = self.pools.get(db_name) {
            if cached.url == url {
                return Ok(cached.pool.clone());
            }
        }
        self.evict_if(db_name, |cached| cached.url != url).await;

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(self.settings.connect_timeout_secs))
            .connect(url.as_str())
            .await
            .map_err(|e| {
                tracing::error!(db_name = %db_name, "failed to connect: {}", e);
                AppError::Upstream(format!("Could not connect to database '{}'", db_name))
            })?;

        self.adopt_pool(db_name, url, pool).await
    }

    /// 缓存新建的池；建池期间登记被删除或改动时丢弃
    async fn adopt_pool(
        &self,
        db_name: &str,
        url: Url,
        pool: MySqlPool,
    ) -> AppResult<MySqlPool> {
        let fresh = CachedPool {
            url: url.clone(),
            pool: pool.clone(),
        };
        // 并发首次连接时保留先写入的池
        let (pool, discarded) = match self.pools.entry(db_name.to_string()) {
            Entry::Occupied(entry) if entry.get().url == url => {
                (entry.get().pool.clone(), Some(pool))
            }
            Entry::Occupied(mut entry) => {
                let stale = entry.insert(fresh);
                (pool, Some(stale.pool))
            }
            Entry::Vacant(entry) => {
                entry.insert(fresh);
                (pool, None)
            }
        };
        if let Some(discarded) = discarded {
            discarded.close().await;
        }

        if self.current_url(db_name).await?.as_ref() != Some(&url) {
            tracing::warn!(
                db_name = %db_name,
                "registration changed while connecting, discarding pool"
            );
            self.evict_if(db_name, |cached| cached.url == url).await;
            return Err(not_found(db_name));
        }
        Ok(pool)
    }

    async fn current_url(&self, db_name: &str) -> AppResult<Option<Url>> {
        match self.repository.get(db_name).await? {
            Some(connection) => Ok(Some(connection.connection_url(&self.settings.driver)?)),
            None => Ok(None),
        }
    }

    async fn evict_if(&self, db_name: &str, predicate: impl Fn(&CachedPool) -> bool) {
        if let Some((_, stale)) = self.pools.remove_if(db_name, |_, cached| predicate(cached)) {
            stale.pool.close().await;
        }
    }
}

fn not_found(db_name: &str) -> AppError {
    AppError::NotFound(format!("Database '{}' not found", db_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresetConnection;
    use crate::services::InMemoryConnectionRepository;

    fn registry(presets: Vec<PresetConnection>) -> DatabaseRegistry {
        let settings = RegistrySettings {
            presets,
            ..RegistrySettings::default()
        };
        DatabaseRegistry::new(Arc::new(InMemoryConnectionRepository::new()), settings)
    }

    fn preset(db_name: &str) -> PresetConnection {
        PresetConnection {
            db_name: db_name.to_string(),
            server: "localhost:3306".to_string(),
            database: "crm".to_string(),
            user: "reader".to_string(),
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let registry = registry(vec![]);
        let message = registry.create(preset("Sales").into()).await.unwrap();
        assert_eq!(message, "Database 'Sales' registered successfully.");
        registry.create(preset("Audit").into()).await.unwrap();

        assert_eq!(registry.list().await.unwrap(), vec!["Audit", "Sales"]);

        registry.delete("Sales").await.unwrap();
        assert_eq!(registry.list().await.unwrap(), vec!["Audit"]);
    }

    #[tokio::test]
    async fn test_duplicate_and_missing() {
        let registry = registry(vec![]);
        registry.create(preset("Sales").into()).await.unwrap();

        let err = registry.create(preset("Sales").into()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = registry.delete("Nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bad_server_is_rejected() {
        let registry = registry(vec![]);
        let mut conn: DatabaseConnection = preset("Sales").into();
        conn.server = "localhost:notaport".to_string();
        assert!(matches!(
            registry.create(conn).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_presets_skips_existing() {
        let registry = registry(vec![preset("CRM Reports"), preset("Sales")]);
        registry.create(preset("Sales").into()).await.unwrap();

        assert_eq!(registry.seed_presets().await.unwrap(), 1);
        assert!(registry.exists("CRM Reports").await.unwrap());
        assert_eq!(registry.seed_presets().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_executor_for_unknown_db() {
        let registry = registry(vec![]);
        assert!(matches!(
            registry.executor_for("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    fn lazy_pool(url: &Url) -> MySqlPool {
        MySqlPoolOptions::new().connect_lazy(url.as_str()).unwrap()
    }

    #[tokio::test]
    async fn test_pool_dropped_when_deleted_while_connecting() {
        let registry = registry(vec![]);
        registry.create(preset("Sales").into()).await.unwrap();
        let url = registry.current_url("Sales").await.unwrap().unwrap();

        registry.delete("Sales").await.unwrap();
        let err = registry
            .adopt_pool("Sales", url.clone(), lazy_pool(&url))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(registry.pools.is_empty());
    }

    #[tokio::test]
    async fn test_pool_dropped_when_re_registered_while_connecting() {
        let registry = registry(vec![]);
        registry.create(preset("Sales").into()).await.unwrap();
        let old_url = registry.current_url("Sales").await.unwrap().unwrap();

        registry.delete("Sales").await.unwrap();
        let mut moved: DatabaseConnection = preset("Sales").into();
        moved.server = "replica:3307".to_string();
        registry.create(moved).await.unwrap();

        assert!(registry
            .adopt_pool("Sales", old_url.clone(), lazy_pool(&old_url))
            .await
            .is_err());
        assert!(registry.pools.is_empty());

        let new_url = registry.current_url("Sales").await.unwrap().unwrap();
        assert_eq!(new_url.port(), Some(3307));
        registry
            .adopt_pool("Sales", new_url.clone(), lazy_pool(&new_url))
            .await
            .unwrap();
        assert_eq!(registry.pools.get("Sales").unwrap().url, new_url);
    }
}
