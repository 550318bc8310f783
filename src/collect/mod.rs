// src/collect/mod.rs
pub mod providers;
pub mod types;

use std::fmt;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::collect::types::{RawPosting, SourceCollector};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scout_raw_postings_total", "Raw postings returned by collectors.");
        describe_counter!(
            "scout_collector_errors_total",
            "Collector fetch/parse errors and timeouts."
        );
        describe_counter!(
            "scout_collector_empty_total",
            "Collector runs that returned no postings."
        );
        describe_histogram!("scout_collector_fetch_ms", "Collector fetch time in milliseconds.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Error(String),
    Timeout,
    Empty,
}

/// A source that contributed nothing this cycle, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorFailure {
    pub collector: &'static str,
    pub kind: FailureKind,
}

impl fmt::Display for CollectorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Error(e) => write!(f, "{}: {}", self.collector, e),
            FailureKind::Timeout => write!(f, "{}: timed out", self.collector),
            FailureKind::Empty => write!(f, "{}: no postings", self.collector),
        }
    }
}

#[derive(Debug, Default)]
pub struct Gathered {
    /// In discovery order: collector order, then the order each collector returned.
    pub postings: Vec<RawPosting>,
    pub failures: Vec<CollectorFailure>,
}

/// Run every collector once. A failing, slow or empty collector is recorded in
/// `failures` and never stops the others; logging those is left to the caller.
pub async fn gather(
    collectors: &[Box<dyn SourceCollector>],
    per_collector_timeout: Option<Duration>,
) -> Gathered {
    ensure_metrics_described();

    let mut out = Gathered::default();
    for c in collectors {
        let t0 = std::time::Instant::now();
        let res = match per_collector_timeout {
            Some(limit) => match tokio::time::timeout(limit, c.fetch()).await {
                Ok(r) => r.map_err(|e| FailureKind::Error(format!("{e:#}"))),
                Err(_) => Err(FailureKind::Timeout),
            },
            None => c.fetch().await.map_err(|e| FailureKind::Error(format!("{e:#}"))),
        };
        histogram!("scout_collector_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(v) if v.is_empty() => {
                counter!("scout_collector_empty_total").increment(1);
                out.failures.push(CollectorFailure {
                    collector: c.name(),
                    kind: FailureKind::Empty,
                });
            }
            Ok(mut v) => {
                tracing::debug!(collector = c.name(), count = v.len(), "collector ok");
                counter!("scout_raw_postings_total").increment(v.len() as u64);
                out.postings.append(&mut v);
            }
            Err(kind) => {
                counter!("scout_collector_errors_total").increment(1);
                out.failures.push(CollectorFailure {
                    collector: c.name(),
                    kind,
                });
            }
        }
    }
    out
}
