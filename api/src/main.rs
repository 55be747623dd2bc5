use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use ld_api::{app::create_app, config, routes::auth::AppState};
use ld_core::repositories::{InMemoryTokenRepository, TokenRepository};
use ld_core::services::{TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig};
use ld_infra::{DatabasePool, MySqlTokenRepository, RedisClient, RedisTokenRepository};
use ld_shared::config::{AppConfig, Environment, LogFormat, LoggingConfig, TokenStoreBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logging comes up first so configuration warnings are not lost
    init_tracing(&LoggingConfig::from_env(Environment::from_env()));
    let config = AppConfig::from_env();

    config::validate(&config).context("invalid configuration")?;

    tracing::info!(
        environment = %config.environment,
        store = ?config.auth.refresh.store,
        "Starting LoanDesk API server"
    );

    match config.auth.refresh.store {
        TokenStoreBackend::Memory => {
            tracing::warn!("Refresh tokens are kept in memory and are lost on restart");
            serve(config.clone(), Arc::new(InMemoryTokenRepository::new())).await
        }
        TokenStoreBackend::MySql => {
            let pool = DatabasePool::new(config.database.clone())
                .await
                .context("failed to connect to MySQL")?;
            pool.run_migrations()
                .await
                .context("failed to apply refresh token schema")?;
            let repository = MySqlTokenRepository::new(pool.get_pool().clone());
            let result = serve(config.clone(), Arc::new(repository)).await;
            pool.close().await;
            result
        }
        TokenStoreBackend::Redis => {
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("failed to connect to Redis")?;
            serve(config.clone(), Arc::new(RedisTokenRepository::new(client))).await
        }
    }
}

async fn serve<T>(config: AppConfig, repository: Arc<T>) -> anyhow::Result<()>
where
    T: TokenRepository + 'static,
{
    let token_service = TokenService::new(
        Arc::clone(&repository),
        TokenServiceConfig::from(&config.auth.refresh),
    )
    .context("invalid refresh token configuration")?;

    let cleanup = Arc::new(TokenCleanupService::new(
        repository,
        TokenCleanupConfig::from(&config.auth.refresh),
    ));
    let cleanup_task = cleanup.start_background_task();

    let state = web::Data::new(
        AppState::new(Arc::new(token_service), config.auth.jwt.clone(), config.environment)
            .with_allowed_origins(config.server.allowed_origins.clone()),
    );

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await
        .context("server terminated with an error");

    if let Some(task) = cleanup_task {
        task.abort();
    }
    tracing::info!("Server stopped");
    result
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    match logging.format {
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => fmt().pretty().with_env_filter(filter).init(),
        LogFormat::Compact => fmt().compact().with_env_filter(filter).init(),
    }
}
