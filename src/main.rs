//! Newsdesk - admin backend for news and announcement posts

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk::{
    api::{self, AppState},
    cache::create_cache,
    config::{Config, StorageDriver},
    db::{
        self,
        repositories::{Latency, MockPostRepository, PostRepository, SqlxPostRepository},
    },
    services::PostService,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting newsdesk...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let repo: Arc<dyn PostRepository> = match config.storage.driver {
        StorageDriver::Memory => {
            tracing::info!(
                "Using in-memory storage with {} seeded posts",
                config.storage.seed_count
            );
            MockPostRepository::seeded(config.storage.seed_count, Latency::from(&config.storage))
                .boxed()
        }
        StorageDriver::Sqlite => {
            let pool = db::create_pool(&config.database).await?;
            tracing::info!("Database connected: {}", config.database.url);
            db::migrations::run_migrations(&pool).await?;
            tracing::info!("Database migrations completed");
            SqlxPostRepository::boxed(pool)
        }
    };

    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized: {:?}", config.cache.driver);

    let post_service = Arc::new(PostService::with_cache_ttl(
        repo,
        cache,
        config.auth.author.clone(),
        std::time::Duration::from_secs(config.cache.ttl_seconds),
    ));

    if config.auth.admin_token.is_none() {
        tracing::warn!("auth.admin_token is not set; any bearer token is accepted");
    }

    let state = AppState {
        post_service,
        upload_config: Arc::new(config.upload.clone()),
        auth_config: Arc::new(config.auth.clone()),
    };

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
