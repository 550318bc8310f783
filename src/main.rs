//! Job scout service entrypoint.
//! Loads configuration, starts the discovery scheduler and serves the status
//! and metrics routes through Shuttle.

use std::sync::Arc;

use job_scout::{app, build_pipeline, init_tracing, metrics::Metrics, scheduler, AppConfig};
use shuttle_axum::ShuttleAxum;
use tokio::sync::Mutex;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;
    tracing::info!(
        channel = ?cfg.channel,
        interval_min = cfg.scrape_interval_minutes,
        seen_path = %cfg.seen_path.display(),
        "job scout starting"
    );

    let metrics = Metrics::init(cfg.scrape_interval_minutes, cfg.min_score_threshold)?;
    let pipeline = build_pipeline(&cfg).await?;
    let status = pipeline.status_handle();

    scheduler::spawn(Arc::new(Mutex::new(pipeline)), cfg.scrape_interval());

    let router = app(status).merge(metrics.router());
    Ok(router.into())
}
