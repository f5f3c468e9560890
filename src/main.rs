//! Boosters Back binary entrypoint wiring the REST layer, storage supervisor and reconciliation.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boosters_back::{
    clock::SystemClock,
    config::{AppConfig, StorageBackend},
    dao::{
        booster_store::{BoosterStore, memory::MemoryBoosterStore},
        storage::StorageError,
    },
    routes,
    services::{reconciliation, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = config.storage.backend;
    let app_state = AppState::new(config, Arc::new(SystemClock));

    spawn_storage_supervisor(app_state.clone(), backend)?;
    tokio::spawn(reconciliation::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn spawn_storage_supervisor(state: SharedState, backend: StorageBackend) -> anyhow::Result<()> {
    match backend {
        StorageBackend::Memory => {
            info!("using in-memory booster store");
            let store = MemoryBoosterStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn BoosterStore>) }
            }));
            Ok(())
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use boosters_back::dao::booster_store::mongodb::{MongoBoosterStore, MongoConfig};

            let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
            let db_name = env::var("MONGO_DB").ok();
            info!(
                database = db_name.as_deref().unwrap_or("boosters"),
                "using MongoDB booster store"
            );

            tokio::spawn(storage_supervisor::run(state, move || {
                let uri = uri.clone();
                let db_name = db_name.clone();
                async move {
                    let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
                    let store = MongoBoosterStore::connect(config).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn BoosterStore>)
                }
            }));
            Ok(())
        }
        #[cfg(not(feature = "mongo-store"))]
        StorageBackend::Mongo => {
            anyhow::bail!("MongoDB storage selected but the `mongo-store` feature is disabled")
        }
    }
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
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
