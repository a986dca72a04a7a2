//! HTTP server initialization and runtime setup.
//!
//! Handles storage and cache setup, event worker spawning, and Axum server
//! lifecycle.

use crate::application::services::LinkRedirectsService;
use crate::config::{Config, StorageBackend};
use crate::domain::event_bus::{DomainEvents, RedirectEventSubscriber};
use crate::domain::repositories::LinkRedirectRepository;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    CachedLinkRedirectRepository, MemoryClickRepository, MemoryLinkRedirectRepository,
    PgClickRepository, PgLinkRedirectRepository,
};
use crate::infrastructure::subscribers::ClickRecorder;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Repository and subscribers for one storage backend.
pub struct Storage {
    pub repository: Arc<dyn LinkRedirectRepository>,
    pub subscribers: Vec<Arc<dyn RedirectEventSubscriber>>,
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage (PostgreSQL pool + migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Redirect event worker with the click recorder
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migrations fail
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let cache = connect_cache(&config).await;

    let storage = match config.storage {
        StorageBackend::Postgres => {
            let pool = connect_database(&config).await?;
            postgres_storage(pool, cache.clone())
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; redirects are lost on shutdown");
            memory_storage()
        }
    };

    let events = DomainEvents::start(
        config.event_queue_capacity,
        config.event_worker_concurrency,
        storage.subscribers,
    );
    tracing::info!("Event worker started");

    let redirects = Arc::new(LinkRedirectsService::new(
        storage.repository.clone(),
        Arc::new(events.clone()),
        config.link_redirects(),
    ));
    tracing::info!(
        "Serving short links under {}{}",
        redirects.base_url(),
        config.redirect_url_prefix
    );

    let state = AppState::new(redirects, storage.repository, cache, events);
    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Opens the connection pool and applies pending migrations.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("Postgres storage requires a database URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// PostgreSQL-backed redirects (behind the lookup cache) and click recording.
pub fn postgres_storage(pool: PgPool, cache: Arc<dyn CacheService>) -> Storage {
    let pool = Arc::new(pool);
    let redirects = Arc::new(PgLinkRedirectRepository::new(pool.clone()));
    let clicks = Arc::new(PgClickRepository::new(pool));

    Storage {
        repository: Arc::new(CachedLinkRedirectRepository::new(redirects, cache)),
        subscribers: vec![Arc::new(ClickRecorder::new(clicks))],
    }
}

/// Process-local storage. Caching is skipped; lookups are already in memory.
pub fn memory_storage() -> Storage {
    let clicks = Arc::new(MemoryClickRepository::new());

    Storage {
        repository: Arc::new(MemoryLinkRedirectRepository::new()),
        subscribers: vec![Arc::new(ClickRecorder::new(clicks))],
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
