//! Policies edge server entry point.

mod app;
mod config;
mod observability;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use health::{
    DatastoreProbe, DependencyProbe, EngineClient, EngineProbe, StatusAggregator, StatusStore,
};
use rbac_gate::{GrantCache, RbacClient, RbacGateState};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();
    let cfg = config::AppConfig::load().context("load configuration")?;

    // Lazy pool: a dead database shows up as a backend-db issue in the status
    // snapshot instead of aborting startup.
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_lazy(&cfg.database.url)
        .context("create database pool")?;
    let http = reqwest::Client::new();

    let store = Arc::new(StatusStore::new());
    let probes: Vec<Arc<dyn DependencyProbe>> = vec![
        Arc::new(DatastoreProbe::new(pool)),
        Arc::new(EngineProbe::new(EngineClient::new(
            http.clone(),
            cfg.engine.base_url.clone(),
        ))),
    ];
    let aggregator = Arc::new(StatusAggregator::new(Arc::clone(&store), probes));
    health::register_degraded_gauge(Arc::clone(&store));

    let gather_task = tokio::spawn(
        Arc::clone(&aggregator).run(Duration::from_secs(cfg.status.interval_secs)),
    );

    let gate = RbacGateState {
        grants: Arc::new(RbacClient::new(
            http,
            cfg.rbac.base_url.clone(),
            cfg.rbac.application.clone(),
        )),
        cache: Arc::new(GrantCache::new(Duration::from_secs(cfg.rbac.grant_ttl_secs))),
    };

    let router = app::build_router(app::AppState { store, aggregator }, gate);

    let listener = tokio::net::TcpListener::bind(cfg.server.listen)
        .await
        .context("bind listener")?;
    tracing::info!(addr = %listener.local_addr()?, "policies server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    gather_task.abort();
    tracing::info!("policies server stopped");
    Ok(())
}
