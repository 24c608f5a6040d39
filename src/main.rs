use std::sync::Arc;

use popcorn_api::{
    config::{Config, StoreBackend},
    logging,
    routes::{create_router, AppState},
    services::{MovieProvider, OmdbProvider, Session, WatchedList},
    store::{
        redis::create_redis_client, FileStore, KeyValueStore, MemoryStore, PersistedStore,
        RedisStore, RedisWriterHandle,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing()?;
    let config = Config::from_env()?;

    let (backend, writer_handle) = open_store(&config).await?;
    let store = PersistedStore::new(backend);
    let watched = Arc::new(WatchedList::load(store).await?);

    let provider: Arc<dyn MovieProvider> = Arc::new(OmdbProvider::new(config.omdb())?);
    tracing::info!(provider = provider.name(), api_url = %config.omdb_api_url, "Movie provider ready");

    let session = Session::new(
        provider,
        watched,
        config.min_query_length,
        &config.default_page_title,
    );
    let app = create_router(AppState::new(session.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown().await;
    if let Some(handle) = writer_handle {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn KeyValueStore>, Option<RedisWriterHandle>)> {
    match config.store_backend {
        StoreBackend::File => {
            let store = FileStore::open(&config.store_dir).await?;
            Ok((Arc::new(store), None))
        }
        StoreBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            let (store, handle) = RedisStore::new(client).await?;
            Ok((Arc::new(store), Some(handle)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; the watched list will not survive a restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
