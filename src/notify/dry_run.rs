// src/notify/dry_run.rs
use anyhow::Result;

use super::Notifier;

/// Writes messages to the log instead of sending them. Useful for tuning the
/// keyword profile without spamming a real chat.
#[derive(Debug, Default, Clone)]
pub struct DryRunNotifier;

#[async_trait::async_trait]
impl Notifier for DryRunNotifier {
    async fn deliver(&self, message: &str, recipient: &str) -> Result<()> {
        tracing::info!(target: "activity", recipient, "dry-run delivery:\n{message}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
