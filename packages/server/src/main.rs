use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use judge::dispatcher::{DispatchConfig, Dispatcher};
use judge::judge0::Judge0Backend;
use judge::problems::StaticProblems;
use judge::store::MemoryStore;
use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let backend = Arc::new(
        Judge0Backend::new(&config.backend).context("Failed to build execution backend client")?,
    );
    info!(
        backend_url = %config.backend.url,
        synchronous = config.backend.synchronous,
        "Execution backend configured"
    );

    let store = Arc::new(MemoryStore::new());
    let problems = Arc::new(StaticProblems::new());
    seed::register_sample_problems(&problems);

    let dispatcher = Arc::new(Dispatcher::new(
        backend,
        store.clone(),
        problems.clone(),
        DispatchConfig::from_app(&config.dispatch, &config.backend),
    ));
    info!(
        max_concurrent = config.dispatch.max_concurrent,
        deadline_ms = config.dispatch.deadline_ms,
        "Dispatcher ready"
    );

    let state = AppState {
        dispatcher,
        store,
        problems,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
