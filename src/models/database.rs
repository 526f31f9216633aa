use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};

pub type DbPool = Pool<MySql>;

/// 连接网关自身的存储库并执行迁移
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
