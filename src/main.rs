use roadmap_tracker::{
    clock::SystemClock, router, AppState, Config, FileStore, StoreAdapter, Tracker,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    fs::create_dir_all(&config.data_dir).await?;

    let backend = Arc::new(FileStore::new(&config.data_dir));
    info!(
        path = %backend.path_for(&config.storage_key).display(),
        editable = config.editable_tasks,
        day_boundary = %config.day_boundary,
        "using file store"
    );

    let adapter = StoreAdapter::new(backend, config.storage_key.clone());
    let clock = Arc::new(SystemClock::new(config.day_boundary));
    let tracker = Tracker::initialize(adapter, clock, config.editable_tasks);
    let app = router(AppState::new(tracker));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
