// src/notify/telegram.rs
use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API `sendMessage` with HTML parse mode. Transport errors, 429 and 5xx are
/// retried with exponential backoff; any other rejection fails immediately.
#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    api_base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    backoff_base: Duration,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Self {
        Self {
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }

    /// Point at a different Bot API server (self-hosted or local stub).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn backoff(&self, attempt: u8) {
        tokio::time::sleep(backoff_delay(self.backoff_base, attempt)).await;
    }
}

/// `base * 2^(attempt-1)`, saturating.
fn backoff_delay(base: Duration, attempt: u8) -> Duration {
    let factor = 1u32
        .checked_shl(u32::from(attempt.saturating_sub(1)))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    #[serde(default)]
    description: Option<String>,
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, message: &str, recipient: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: recipient,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(self.endpoint())
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) if rsp.status().is_success() => return Ok(()),
                Ok(rsp) => {
                    let status = rsp.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if retryable && attempt < self.max_retries {
                        tracing::debug!(%status, attempt, "telegram send failed; retrying");
                        self.backoff(attempt).await;
                        continue;
                    }
                    let reason = rsp
                        .json::<ApiReply>()
                        .await
                        .ok()
                        .and_then(|r| r.description)
                        .unwrap_or_default();
                    return Err(anyhow!("Telegram API error {status}: {reason}"));
                }
                Err(e) => {
                    // The request url carries the bot token.
                    let e = e.without_url();
                    if attempt < self.max_retries {
                        tracing::debug!(error = %e, attempt, "telegram request failed; retrying");
                        self.backoff(attempt).await;
                        continue;
                    }
                    return Err(anyhow!("Telegram request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
