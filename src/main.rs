mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod tests;
mod utils;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Settings;
use models::create_pool;
use routes::create_app;
use services::{
    AskEngine, ConnectionRepository, DatabaseRegistry, InMemoryConnectionRepository,
    InMemoryUserRepository, MySqlConnectionRepository, MySqlUserRepository, OpenAiClient,
    SqlAgent, TokenService, UserRepository, UserService,
};
use state::AppState;
use utils::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ask_gateway=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load configuration ({}), using defaults", e);
        Settings::default()
    });

    tracing::info!("Starting Ask Gateway server...");
    tracing::info!("Configuration: {:?}", settings);

    // 用户与连接登记：配置了 database.url 用 MySQL，否则放内存
    let (user_repository, connection_repository): (
        Arc<dyn UserRepository>,
        Arc<dyn ConnectionRepository>,
    ) = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            tracing::info!("Database connection pool created");
            (
                Arc::new(MySqlUserRepository::new(pool.clone())),
                Arc::new(MySqlConnectionRepository::new(pool)),
            )
        }
        None => {
            tracing::warn!("database.url is not set, users and registrations live in memory");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryConnectionRepository::new()),
            )
        }
    };

    let token_service = Arc::new(TokenService::new(settings.auth.token_ttl_minutes));
    let user_service = Arc::new(UserService::new(user_repository, token_service.clone()));
    if user_service.ensure_bootstrap_user(&settings.auth).await? {
        tracing::info!("Bootstrap user created");
    }

    let registry = Arc::new(DatabaseRegistry::new(
        connection_repository,
        settings.registry.clone(),
    ));
    let seeded = registry.seed_presets().await?;
    tracing::info!("{} preset database(s) registered", seeded);

    if settings.llm.api_key.is_none() {
        tracing::warn!("No OpenAI API key configured, /ask requires api_key in each request");
    }
    let llm = Arc::new(OpenAiClient::new(&settings.llm)?);
    let ask_engine: Arc<dyn AskEngine> =
        Arc::new(SqlAgent::new(registry.clone(), llm, settings.llm.clone()));

    let addr = settings.listen_addr();
    let app_state = AppState::new(
        Arc::new(settings),
        user_service,
        token_service.clone(),
        registry,
        ask_engine,
    );

    session_sweeper(token_service);

    let app = create_app(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 定期清理过期令牌
fn session_sweeper(token_service: Arc<TokenService>) {
    tokio::task::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = token_service.purge_expired();
            if purged > 0 {
                tracing::debug!("purged {} expired session(s)", purged);
            }
        }
    });
}
