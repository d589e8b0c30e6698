use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spellbook_api::api::{self, AppState, Backends};
use spellbook_api::config::Config;
use spellbook_api::db;
use spellbook_api::gateway::{FsObjectStore, PgJobQueue, UrlSigner};
use spellbook_api::llm;
use spellbook_api::repository::{PgClassRepository, PgJobRecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spellbook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Spellbook API...");

    let config = Config::from_env()?;
    config.validate()?;

    if config.uses_dev_secret() {
        tracing::warn!("URL_SIGNING_SECRET is not set, using the development secret");
    }

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let signer = Arc::new(
        UrlSigner::new(config.signing_secret.as_bytes(), &config.public_url)
            .map_err(|e| anyhow::anyhow!("Invalid URL signing secret: {}", e))?,
    );

    let llm = llm::build_provider(&config.llm)?;
    tracing::info!("Using LLM provider: {}", llm.name());

    tracing::info!("Object store rooted at {}", config.object_store_root);

    let backends = Backends {
        store: Arc::new(FsObjectStore::new(&config.object_store_root, signer.clone())),
        queue: Arc::new(PgJobQueue::new(pool.clone())),
        records: Arc::new(PgJobRecordStore::new(pool.clone())),
        classes: Arc::new(PgClassRepository::new(pool)),
        llm,
        signer,
    };

    // Build router with all API endpoints
    let app = api::create_router(AppState::new(backends, &config));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Spellbook API stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
