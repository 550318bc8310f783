// src/notify/email.rs
use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;

/// SMTP delivery. The recipient passed to `deliver` is the destination address.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailNotifier {
    pub fn new(host: &str, user: String, pass: String, from: &str) -> Result<Self> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP host {host}"))?
            .credentials(Credentials::new(user, pass))
            .build();
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address {from}"))?;
        Ok(Self { mailer, from })
    }

    /// Reads SMTP_HOST, SMTP_USER, SMTP_PASS and NOTIFY_EMAIL_FROM.
    pub fn from_env() -> Result<Self> {
        let var = |k: &str| std::env::var(k).map_err(|_| anyhow!("{k} missing"));
        Self::new(
            &var("SMTP_HOST")?,
            var("SMTP_USER")?,
            var("SMTP_PASS")?,
            &var("NOTIFY_EMAIL_FROM")?,
        )
    }
}

/// First line of the message with markup removed.
pub(crate) fn subject_line(message: &str) -> String {
    let first = message.lines().next().unwrap_or_default();
    let plain = crate::posting::normalize_text(first);
    if plain.is_empty() {
        "New job posting".to_string()
    } else {
        format!("New job: {plain}")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, message: &str, recipient: &str) -> Result<()> {
        let to = recipient
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address {recipient}"))?;
        let body = message.replace('\n', "<br>\n");

        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject_line(message))
            .header(header::ContentType::TEXT_HTML)
            .body(body)
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
