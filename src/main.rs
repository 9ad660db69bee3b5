//! CatchUp: binary entrypoint.
//! Loads config, starts the refresh scheduler and serves the local JSON API
//! until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_catchup::api::{self, AppState};
use trend_catchup::app::TrendApp;
use trend_catchup::config::AppConfig;
use trend_catchup::ingest::fetch::HttpFetcher;
use trend_catchup::ingest::providers::default_providers;
use trend_catchup::kv::{JsonFileStore, KvStore, MemoryStore};
use trend_catchup::metrics::Metrics;

/// Compact logs by default, JSON lines when CATCHUP_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_catchup=info,warn"));

    let json = std::env::var("CATCHUP_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn open_store(cfg: &AppConfig) -> Arc<dyn KvStore> {
    if cfg.store_path.is_empty() {
        tracing::warn!("no store_path configured, favorites will not survive restarts");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!(path = %cfg.store_path, "using json file store");
        Arc::new(JsonFileStore::new(&cfg.store_path))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = ?e, "failed to listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;
    tracing::info!(
        bind = %cfg.bind,
        refresh_secs = cfg.refresh_interval_secs,
        subreddits = ?cfg.reddit.subreddits,
        "configuration loaded"
    );

    let kv = open_store(&cfg);
    let fetcher = Arc::new(HttpFetcher::new(&cfg.fetch)?);
    let providers = default_providers(fetcher, cfg.reddit.subreddits.clone());
    let app = Arc::new(TrendApp::with_store(providers, kv));

    // Recorder must be installed before the first cycle records anything.
    let metrics = if cfg.metrics {
        Some(Metrics::init(cfg.refresh_interval_secs)?)
    } else {
        None
    };

    // First tick runs the initial load.
    let handle = app
        .scheduler()
        .spawn(Duration::from_secs(cfg.refresh_interval_secs));

    let mut router = api::router(AppState::new(app.clone()));
    if let Some(metrics) = &metrics {
        router = router.merge(metrics.router());
    }

    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    tracing::info!(addr = %cfg.bind, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    handle.stop();
    tracing::info!("scheduler stopped, bye");
    Ok(())
}
