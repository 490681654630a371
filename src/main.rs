//! Game reviews back binary entrypoint wiring the REST API to the configured storage backend.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use game_reviews_back::{
    config::{AppConfig, StorageBackend, StorageConfig},
    dao::record_store::memory::MemoryRecordStore,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new();

    start_storage(&app_state, config.storage).await?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured backend, supervising remote ones in the background.
async fn start_storage(state: &SharedState, storage: StorageConfig) -> anyhow::Result<()> {
    info!(backend = %storage.backend, "selecting storage backend");
    match storage.backend {
        StorageBackend::Memory => {
            warn!("records are kept in memory and lost on restart");
            state.set_store(Arc::new(MemoryRecordStore::new())).await;
            Ok(())
        }
        StorageBackend::Mongo => spawn_mongo(state, storage),
        StorageBackend::Couch => spawn_couch(state, storage),
    }
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo(state: &SharedState, storage: StorageConfig) -> anyhow::Result<()> {
    use game_reviews_back::dao::{
        record_store::{
            RecordStore,
            mongodb::{MongoConfig, MongoRecordStore},
        },
        storage::StorageError,
    };

    async fn connect(uri: String, db: String) -> Result<Arc<dyn RecordStore>, StorageError> {
        let config = MongoConfig::from_uri(&uri, &db).await?;
        let store = MongoRecordStore::connect(config).await?;
        Ok(Arc::new(store))
    }

    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        connect(storage.mongo_uri.clone(), storage.mongo_db.clone())
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo(_state: &SharedState, _storage: StorageConfig) -> anyhow::Result<()> {
    anyhow::bail!("mongo backend selected but the `mongo-store` feature is disabled")
}

#[cfg(feature = "couch-store")]
fn spawn_couch(state: &SharedState, storage: StorageConfig) -> anyhow::Result<()> {
    use game_reviews_back::dao::{
        record_store::{
            RecordStore,
            couchdb::{CouchConfig, CouchRecordStore},
        },
        storage::StorageError,
    };

    async fn connect(config: CouchConfig) -> Result<Arc<dyn RecordStore>, StorageError> {
        let store = CouchRecordStore::connect(config).await?;
        Ok(Arc::new(store))
    }

    let config = CouchConfig::new(storage.couch_base_url, storage.couch_db)
        .with_credentials(storage.couch_username, storage.couch_password);
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        connect(config.clone())
    }));
    Ok(())
}

#[cfg(not(feature = "couch-store"))]
fn spawn_couch(_state: &SharedState, _storage: StorageConfig) -> anyhow::Result<()> {
    anyhow::bail!("couch backend selected but the `couch-store` feature is disabled")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
