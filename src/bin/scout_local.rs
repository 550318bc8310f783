//! Run the scout without Shuttle.
//!
//! `scout_local --once` runs a single cycle and prints the report as JSON;
//! without flags it serves `/health`, `/status` and `/metrics` on `http_port`
//! and runs the scheduler.

use std::sync::Arc;

use anyhow::Result;
use job_scout::{app, build_pipeline, init_tracing, metrics::Metrics, scheduler, AppConfig};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let once = std::env::args().skip(1).any(|a| a == "--once");
    let cfg = AppConfig::load()?;
    let mut pipeline = build_pipeline(&cfg).await?;

    if once {
        let report = pipeline.run_cycle(chrono::Utc::now()).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let metrics = Metrics::init(cfg.scrape_interval_minutes, cfg.min_score_threshold)?;
    let status = pipeline.status_handle();
    scheduler::spawn(Arc::new(Mutex::new(pipeline)), cfg.scrape_interval());

    let router = app(status).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.http_port)).await?;
    tracing::info!(port = cfg.http_port, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
