// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod classify;
pub mod collect;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod posting;
pub mod recency;
pub mod relevance;
pub mod scheduler;
pub mod seen;

// ---- Re-exports for stable public API ----
pub use crate::collect::types::{RawPosting, SourceCollector};
pub use crate::config::{AppConfig, Channel};
pub use crate::notify::Notifier;
pub use crate::pipeline::{CycleReport, CycleStage, Pipeline, PipelineSettings};
pub use crate::posting::{ApplyMethod, ExperienceLevel, Posting, ScoredPosting};
pub use crate::relevance::{KeywordProfile, RelevanceScorer};
pub use crate::seen::SeenStore;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::AppState;
use crate::pipeline::SharedStatus;

pub const DEFAULT_LOG_FILTER: &str = "job_scout=info,activity=info,warn";

/// Install the tracing subscriber: `RUST_LOG` (or [`DEFAULT_LOG_FILTER`]),
/// compact text by default, JSON lines when `LOG_FORMAT=json`. Safe to call
/// when a subscriber is already installed.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Wire the live pipeline from configuration: keyword profile, the four
/// listing collectors, the selected notifier and the durable seen-set.
pub async fn build_pipeline(cfg: &AppConfig) -> anyhow::Result<Pipeline> {
    let profile = KeywordProfile::load(cfg.keyword_profile_path.as_deref())?;
    let store = SeenStore::load(cfg.seen_path.clone()).await;
    Ok(Pipeline::new(
        cfg.build_collectors()?,
        RelevanceScorer::new(profile),
        cfg.build_notifier()?,
        store,
        PipelineSettings::from_config(cfg),
    ))
}

/// Status router (`/health`, `/status`) over a pipeline's status handle.
pub fn app(status: SharedStatus) -> Router {
    api::create_router(AppState::new(status))
}
