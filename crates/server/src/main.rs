use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use roamdb_engine::{Store, StoreOptions};
use roamdb_server::{load_in_background, router, AppState, Archive, Cli, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::resolve(&cli)?;

    let filter = EnvFilter::try_new(&config.log)
        .with_context(|| format!("invalid log filter {:?}", config.log))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers {
        runtime.worker_threads(workers);
    }
    let runtime = runtime
        .enable_all()
        .build()
        .context("cannot start the async runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let archive = Archive::open(&config.data)
        .with_context(|| format!("cannot open archive {}", config.data.display()))?;

    let reference_time = config.reference_time.or_else(|| archive.reference_time());
    let store = Arc::new(Store::with_options(StoreOptions {
        reference_time,
        ..Default::default()
    }));
    info!(reference_time = store.reference_time(), "store ready");

    load_in_background(Arc::clone(&store), archive);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
