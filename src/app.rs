use crate::cache::CacheClient;
use crate::cache::count::CounterQueue;
use crate::db::{self, ConnectionPool, ConnectionResult};
use crate::storage::ObjectStore;
use crate::{api, config, filesystem};
use axum::extract::Request;
use axum::ServiceExt;
use std::error::Error;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::signal::unix::SignalKind;
use tower::ServiceBuilder;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Clone)]
pub struct AppState {
    pub connection_pool: ConnectionPool,
    pub object_store: ObjectStore,
    pub cache: CacheClient,
    pub counters: CounterQueue,
    pub http: reqwest::Client,
}

impl AppState {
    pub async fn new() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let connection_pool = db::create_connection_pool();
        let object_store = ObjectStore::connect().await;
        let cache = CacheClient::connect().await?;
        let counters = CounterQueue::start(cache.clone(), connection_pool.clone());
        Ok(AppState {
            connection_pool,
            object_store,
            cache,
            counters,
            http: reqwest::Client::new(),
        })
    }

    pub fn get_connection(&self) -> ConnectionResult {
        self.connection_pool.get()
    }
}

/// Initializes logging using [`tracing_subscriber`].
pub fn enable_tracing() {
    let directives = config::get().log_filter.as_deref().unwrap_or("info");
    let filter = match EnvFilter::try_new(directives) {
        Ok(filter) => filter,
        Err(err) => {
            warn!("Log filter is invalid. Some or all directives may be ignored. Details:\n{err}");
            EnvFilter::new("info")
        }
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

pub fn initialize(state: &AppState) -> Result<(), Box<dyn Error + Send + Sync>> {
    db::run_database_migrations(&state.connection_pool)?;
    if let Err(err) = filesystem::purge_scratch_files() {
        warn!("Failed to purge scratch files. Details:\n{err}");
    }
    Ok(())
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let router = api::routes(state);
    let app = ServiceBuilder::new()
        .layer(NormalizePathLayer::trim_trailing_slash())
        .service(router);

    let address = format!("0.0.0.0:{}", config::port());
    let listener = TcpListener::bind(address).await?;
    info!("Aviary upload service running on {} threads", Handle::current().metrics().num_workers());
    debug!("listening on {}", listener.local_addr()?);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Ctrl+C handler must be installable");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(SignalKind::terminate())
            .expect("Signal handler must be installable")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Stopping server...");
}
