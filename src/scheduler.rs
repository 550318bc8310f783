// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::Pipeline;

pub type SharedPipeline = Arc<Mutex<Pipeline>>;

/// Run a cycle now and then every `interval`. A tick that finds the previous
/// cycle still running is skipped.
pub fn spawn(pipeline: SharedPipeline, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            run_tick(&pipeline).await;
        }
    })
}

/// One scheduler tick. Returns `false` when the tick was skipped because a
/// cycle is already in flight.
pub async fn run_tick(pipeline: &SharedPipeline) -> bool {
    let Ok(mut guard) = pipeline.try_lock() else {
        tracing::warn!(target: "activity", "previous cycle still running; skipping tick");
        counter!("scout_ticks_skipped_total").increment(1);
        return false;
    };
    let report = guard.run_cycle(chrono::Utc::now()).await;
    tracing::debug!(delivered = report.delivered.len(), "tick done");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::DryRunNotifier;
    use crate::pipeline::PipelineSettings;
    use crate::relevance::{KeywordProfile, RelevanceScorer};
    use crate::seen::SeenStore;

    fn idle_pipeline(dir: &std::path::Path) -> SharedPipeline {
        Arc::new(Mutex::new(Pipeline::new(
            Vec::new(),
            RelevanceScorer::new(KeywordProfile::default_seed()),
            Box::new(DryRunNotifier),
            SeenStore::empty(dir.join("seen.json")),
            PipelineSettings::default(),
        )))
    }

    #[tokio::test]
    async fn tick_is_skipped_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let p = idle_pipeline(dir.path());

        let held = p.lock().await;
        assert!(!run_tick(&p).await);
        drop(held);

        assert!(run_tick(&p).await);
        let status = p.lock().await.status_handle();
        assert_eq!(status.read().unwrap().cycles, 1);
    }

    #[tokio::test]
    async fn first_cycle_runs_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let p = idle_pipeline(dir.path());
        let status = p.lock().await.status_handle();

        let handle = spawn(p.clone(), Duration::from_secs(3600));
        for _ in 0..100 {
            if status.read().unwrap().cycles >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert_eq!(status.read().unwrap().cycles, 1);
    }
}
