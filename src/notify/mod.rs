// src/notify/mod.rs
pub mod dry_run;
pub mod email;
pub mod format;
pub mod telegram;

use anyhow::Result;

/// Delivery channel for formatted messages. The message is HTML-flavoured rich
/// text (bold, italics, links) as produced by [`format::format_message`].
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &str, recipient: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub use dry_run::DryRunNotifier;
pub use email::EmailNotifier;
pub use format::{format_message, FormatOptions, RelevanceTier};
pub use telegram::TelegramNotifier;
