// src/pipeline.rs
//! One discovery cycle: gather → recency filter → score/classify → dedup →
//! notify → persist.
//!
//! The pipeline owns the seen-set. `run_cycle` takes `&mut self`, so a cycle
//! cannot overlap with another one on the same pipeline.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::collect::{gather, types::SourceCollector, CollectorFailure};
use crate::config::AppConfig;
use crate::notify::{format_message, FormatOptions, Notifier};
use crate::posting::{Posting, ScoredPosting};
use crate::recency::RecencyFilter;
use crate::relevance::RelevanceScorer;
use crate::seen::SeenStore;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scout_cycles_total", "Completed discovery cycles.");
        describe_counter!(
            "scout_postings_dropped_total",
            "Postings dropped before notification, by reason."
        );
        describe_counter!("scout_notifications_sent_total", "Postings delivered.");
        describe_counter!(
            "scout_notification_failures_total",
            "Deliveries that failed (retried next cycle)."
        );
        describe_counter!("scout_store_flush_errors_total", "Failed seen-set flushes.");
        describe_counter!(
            "scout_ticks_skipped_total",
            "Scheduler ticks skipped because a cycle was still running."
        );
        describe_gauge!("scout_seen_set_size", "Identifiers in the seen-set.");
        describe_gauge!("scout_last_cycle_ts", "Unix ts of the last finished cycle.");
        describe_histogram!("scout_cycle_ms", "Cycle wall time in milliseconds.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CycleStage {
    Gathering,
    Filtering,
    Scoring,
    Deduplicating,
    Notifying,
    Persisting,
    #[default]
    Idle,
}

/// What happened in one cycle. Counts are per stage, in stage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub gathered: usize,
    pub malformed: usize,
    pub too_old: usize,
    pub scored: usize,
    pub already_seen: usize,
    pub below_threshold: usize,
    pub repeated_in_cycle: usize,
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
    pub collector_failures: Vec<CollectorFailure>,
    /// `false` when the seen-set flush failed; it is retried next cycle.
    pub flushed: bool,
    pub duration_ms: u64,
}

impl CycleReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            gathered: 0,
            malformed: 0,
            too_old: 0,
            scored: 0,
            already_seen: 0,
            below_threshold: 0,
            repeated_in_cycle: 0,
            delivered: Vec::new(),
            failed: Vec::new(),
            collector_failures: Vec::new(),
            flushed: true,
            duration_ms: 0,
        }
    }
}

/// Read-mostly snapshot for the HTTP status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStatus {
    pub stage: CycleStage,
    pub cycles: u64,
    pub seen_count: usize,
    pub last_report: Option<CycleReport>,
}

pub type SharedStatus = Arc<RwLock<PipelineStatus>>;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub min_score_threshold: u32,
    pub recency: RecencyFilter,
    pub collector_timeout: Option<Duration>,
    pub delivery_pause: Duration,
    pub format: FormatOptions,
    pub recipient: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_score_threshold: 1,
            recency: RecencyFilter::default(),
            collector_timeout: None,
            delivery_pause: Duration::ZERO,
            format: FormatOptions::default(),
            recipient: String::new(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            min_score_threshold: cfg.min_score_threshold,
            recency: cfg.recency_filter(),
            collector_timeout: Some(cfg.collector_timeout()),
            delivery_pause: cfg.delivery_pause(),
            format: cfg.format_options(),
            recipient: cfg.recipient().to_string(),
        }
    }
}

pub struct Pipeline {
    collectors: Vec<Box<dyn SourceCollector>>,
    scorer: RelevanceScorer,
    notifier: Box<dyn Notifier>,
    store: SeenStore,
    settings: PipelineSettings,
    status: SharedStatus,
    cycles: u64,
}

impl Pipeline {
    pub fn new(
        collectors: Vec<Box<dyn SourceCollector>>,
        scorer: RelevanceScorer,
        notifier: Box<dyn Notifier>,
        store: SeenStore,
        settings: PipelineSettings,
    ) -> Self {
        ensure_metrics_described();
        let status = Arc::new(RwLock::new(PipelineStatus {
            seen_count: store.len(),
            ..PipelineStatus::default()
        }));
        gauge!("scout_seen_set_size").set(store.len() as f64);
        Self {
            collectors,
            scorer,
            notifier,
            store,
            settings,
            status,
            cycles: 0,
        }
    }

    /// Handle readable while a cycle is running.
    pub fn status_handle(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    fn enter(&self, stage: CycleStage) {
        debug!(target: "activity", ?stage, "stage");
        self.publish(|s| s.stage = stage);
    }

    fn publish(&self, f: impl FnOnce(&mut PipelineStatus)) {
        let mut guard = self.status.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }

    fn score(&self, posting: Posting) -> ScoredPosting {
        let rel = self.scorer.score(&posting);
        let (experience, apply_method) = classify(&posting);
        ScoredPosting {
            posting,
            score: rel.score,
            matched_terms: rel.matched,
            experience,
            apply_method,
        }
    }

    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let t0 = Instant::now();
        let mut report = CycleReport::new(now);
        info!(target: "activity", at = %now.to_rfc3339(), "cycle started");

        // Gathering
        self.enter(CycleStage::Gathering);
        let gathered = gather(&self.collectors, self.settings.collector_timeout).await;
        report.gathered = gathered.postings.len();
        report.collector_failures = gathered.failures;
        for f in &report.collector_failures {
            warn!(target: "activity", failure = %f, "collector contributed nothing");
        }

        let mut postings = Vec::with_capacity(report.gathered);
        for raw in gathered.postings {
            match Posting::from_raw(raw) {
                Ok(p) => postings.push(p),
                Err(e) => {
                    report.malformed += 1;
                    debug!(error = %e, "skipping malformed posting");
                }
            }
        }
        drop_metric("malformed", report.malformed);

        // Filtering
        self.enter(CycleStage::Filtering);
        let before = postings.len();
        postings.retain(|p| self.settings.recency.keep(p, now));
        report.too_old = before - postings.len();
        drop_metric("too_old", report.too_old);

        // Scoring
        self.enter(CycleStage::Scoring);
        let scored: Vec<ScoredPosting> = postings.into_iter().map(|p| self.score(p)).collect();
        report.scored = scored.len();

        // Deduplicating
        self.enter(CycleStage::Deduplicating);
        let mut fresh = Vec::with_capacity(scored.len());
        for sp in scored {
            if self.store.has(&sp.posting.identifier) {
                report.already_seen += 1;
            } else if sp.score < self.settings.min_score_threshold {
                report.below_threshold += 1;
            } else {
                fresh.push(sp);
            }
        }
        // Stable: equal score and source keep discovery order.
        fresh.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.posting.source.cmp(&b.posting.source))
        });
        let mut ids = HashSet::new();
        let before = fresh.len();
        fresh.retain(|sp| ids.insert(sp.posting.identifier.clone()));
        report.repeated_in_cycle = before - fresh.len();
        drop_metric("already_seen", report.already_seen);
        drop_metric("below_threshold", report.below_threshold);
        drop_metric("repeated", report.repeated_in_cycle);

        info!(
            target: "activity",
            gathered = report.gathered,
            malformed = report.malformed,
            too_old = report.too_old,
            already_seen = report.already_seen,
            below_threshold = report.below_threshold,
            to_notify = fresh.len(),
            "postings filtered"
        );

        // Notifying
        self.enter(CycleStage::Notifying);
        for (i, sp) in fresh.iter().enumerate() {
            if i > 0 && !self.settings.delivery_pause.is_zero() {
                tokio::time::sleep(self.settings.delivery_pause).await;
            }
            let message = format_message(sp, now, &self.settings.format);
            let id = &sp.posting.identifier;
            match self.notifier.deliver(&message, &self.settings.recipient).await {
                Ok(()) => {
                    info!(
                        target: "activity",
                        id = %id,
                        title = %sp.posting.title,
                        source = %sp.posting.source,
                        score = sp.score,
                        channel = self.notifier.name(),
                        "notified"
                    );
                    counter!("scout_notifications_sent_total").increment(1);
                    report.delivered.push(id.clone());
                }
                Err(e) => {
                    warn!(
                        target: "activity",
                        id = %id,
                        channel = self.notifier.name(),
                        error = %e,
                        "delivery failed; will retry next cycle"
                    );
                    counter!("scout_notification_failures_total").increment(1);
                    report.failed.push(id.clone());
                }
            }
        }

        // Persisting
        self.enter(CycleStage::Persisting);
        for id in &report.delivered {
            self.store.mark_seen(id, now);
        }
        if self.store.is_dirty() {
            if let Err(e) = self.store.flush().await {
                warn!(target: "activity", error = %e, "seen-set flush failed; keeping in memory");
                counter!("scout_store_flush_errors_total").increment(1);
                report.flushed = false;
            }
        }

        report.duration_ms = t0.elapsed().as_millis() as u64;
        self.cycles += 1;
        counter!("scout_cycles_total").increment(1);
        gauge!("scout_seen_set_size").set(self.store.len() as f64);
        gauge!("scout_last_cycle_ts").set(now.timestamp() as f64);
        histogram!("scout_cycle_ms").record(report.duration_ms as f64);

        info!(
            target: "activity",
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            flushed = report.flushed,
            seen = self.store.len(),
            ms = report.duration_ms,
            "cycle finished"
        );

        let cycles = self.cycles;
        let seen_count = self.store.len();
        let snapshot = report.clone();
        self.publish(move |s| {
            s.stage = CycleStage::Idle;
            s.cycles = cycles;
            s.seen_count = seen_count;
            s.last_report = Some(snapshot);
        });
        report
    }
}

fn drop_metric(reason: &'static str, n: usize) {
    if n > 0 {
        counter!("scout_postings_dropped_total", "reason" => reason).increment(n as u64);
    }
}
