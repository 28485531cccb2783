use std::sync::Arc;

use anyhow::Context;

use moodlog_api::config::Config;
use moodlog_api::store::{LogStore, MemoryLogStore, PgLogStore};
use moodlog_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    if config.notes_key_is_default() {
        tracing::warn!("NOTES_ENCRYPTION_KEY is not set; notes are encrypted with the built-in default key");
    }

    let store: Arc<dyn LogStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Arc::new(PgLogStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; logs are kept in memory and lost on restart");
            Arc::new(MemoryLogStore::new())
        }
    };

    let app = routes::app(AppState::new(store, config.clone()));

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
