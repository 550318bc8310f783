// src/config.rs
//! Service configuration: optional TOML file, then environment overrides.
//!
//! Lookup order for the file:
//! 1) `$JOB_SCOUT_CONFIG` (must exist when set)
//! 2) `config/job_scout.toml`
//! 3) built-in defaults
//!
//! Env overrides are applied on top (a `.env` file is loaded by the binary via
//! dotenvy before this runs).

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::collect::providers::{
    http_client, indeed::IndeedCollector, internshala::InternshalaCollector,
    linkedin::LinkedInCollector, naukri::NaukriCollector,
};
use crate::collect::types::SourceCollector;
use crate::notify::{DryRunNotifier, EmailNotifier, FormatOptions, Notifier, TelegramNotifier};
use crate::recency::{RecencyFilter, UnknownAgePolicy};
use crate::seen::DEFAULT_SEEN_PATH;

pub const ENV_CONFIG_PATH: &str = "JOB_SCOUT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/job_scout.toml";

/// Sources that can carry a session credential, by lower-cased collector name.
pub const CREDENTIAL_SOURCES: &[&str] = &["linkedin", "indeed", "naukri", "internshala"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Telegram,
    Email,
    /// Dry run: messages go to the log only.
    Log,
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Channel::Telegram),
            "email" => Ok(Channel::Email),
            "log" | "dry-run" | "dryrun" => Ok(Channel::Log),
            other => Err(anyhow!("unknown notification channel `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrape_interval_minutes: u64,
    pub recency_window_days: i64,
    pub unknown_age: UnknownAgePolicy,
    pub min_score_threshold: u32,
    pub channel: Channel,
    pub recipient: Option<String>,
    pub telegram_token: Option<String>,
    pub seen_path: PathBuf,
    pub keyword_profile_path: Option<PathBuf>,
    pub search_query: String,
    pub internship_query: String,
    pub search_location: String,
    pub collector_timeout_secs: u64,
    pub delivery_pause_ms: u64,
    pub excerpt_chars: usize,
    /// Per-source session cookie, keyed by lower-cased source name.
    pub source_credentials: HashMap<String, String>,
    pub http_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scrape_interval_minutes: 30,
            recency_window_days: crate::recency::DEFAULT_MAX_AGE_DAYS,
            unknown_age: UnknownAgePolicy::Keep,
            min_score_threshold: 1,
            channel: Channel::Telegram,
            recipient: None,
            telegram_token: None,
            seen_path: PathBuf::from(DEFAULT_SEEN_PATH),
            keyword_profile_path: None,
            search_query: "DevOps Engineer".to_string(),
            internship_query: "DevOps".to_string(),
            search_location: "India".to_string(),
            collector_timeout_secs: 60,
            delivery_pause_ms: 1000,
            excerpt_chars: crate::notify::format::DEFAULT_EXCERPT_CHARS,
            source_credentials: HashMap::new(),
            http_port: 8000,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.source_credentials = cfg
            .source_credentials
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// File (see module docs) + process environment, validated.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from(&pb)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay values from `get` (normally the process environment).
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        fn parse<T: FromStr>(key: &str, v: String) -> Result<T>
        where
            T::Err: std::fmt::Display,
        {
            v.parse::<T>()
                .map_err(|e| anyhow!("invalid {key}=`{v}`: {e}"))
        }

        if let Some(v) = get("SCRAPE_INTERVAL_MINUTES") {
            self.scrape_interval_minutes = parse("SCRAPE_INTERVAL_MINUTES", v)?;
        }
        if let Some(v) = get("RECENCY_WINDOW_DAYS") {
            self.recency_window_days = parse("RECENCY_WINDOW_DAYS", v)?;
        }
        if let Some(v) = get("MIN_SCORE_THRESHOLD") {
            self.min_score_threshold = parse("MIN_SCORE_THRESHOLD", v)?;
        }
        if let Some(v) = get("NOTIFY_CHANNEL") {
            self.channel = v.parse()?;
        }
        if let Some(v) = get("NOTIFY_RECIPIENT").or_else(|| get("TELEGRAM_CHAT_ID")) {
            self.recipient = Some(v);
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram_token = Some(v);
        }
        if let Some(v) = get("SEEN_PATH") {
            self.seen_path = PathBuf::from(v);
        }
        if let Some(v) = get(crate::relevance::ENV_KEYWORD_PROFILE_PATH) {
            self.keyword_profile_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SEARCH_QUERY") {
            self.search_query = v;
        }
        if let Some(v) = get("INTERNSHIP_QUERY") {
            self.internship_query = v;
        }
        if let Some(v) = get("SEARCH_LOCATION") {
            self.search_location = v;
        }
        if let Some(v) = get("COLLECTOR_TIMEOUT_SECS") {
            self.collector_timeout_secs = parse("COLLECTOR_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = get("DELIVERY_PAUSE_MS") {
            self.delivery_pause_ms = parse("DELIVERY_PAUSE_MS", v)?;
        }
        if let Some(v) = get("HTTP_PORT") {
            self.http_port = parse("HTTP_PORT", v)?;
        }
        for src in CREDENTIAL_SOURCES {
            let key = format!("{}_COOKIE", src.to_ascii_uppercase());
            if let Some(v) = get(&key) {
                self.source_credentials.insert(src.to_string(), v);
            }
        }
        Ok(())
    }

    /// Startup checks. A channel without its recipient or token is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.scrape_interval_minutes == 0 {
            bail!("scrape_interval_minutes must be at least 1");
        }
        if self.recency_window_days < 0 {
            bail!("recency_window_days must not be negative");
        }
        match self.channel {
            Channel::Telegram => {
                if self.telegram_token.is_none() {
                    bail!("telegram channel selected but TELEGRAM_BOT_TOKEN is not set");
                }
                if self.recipient.is_none() {
                    bail!("telegram channel selected but no recipient (TELEGRAM_CHAT_ID) is set");
                }
            }
            Channel::Email => {
                if self.recipient.is_none() {
                    bail!("email channel selected but NOTIFY_RECIPIENT is not set");
                }
            }
            Channel::Log => {}
        }
        Ok(())
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_minutes * 60)
    }

    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector_timeout_secs)
    }

    pub fn delivery_pause(&self) -> Duration {
        Duration::from_millis(self.delivery_pause_ms)
    }

    pub fn recency_filter(&self) -> RecencyFilter {
        RecencyFilter::new(self.recency_window_days).with_unknown_age(self.unknown_age)
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            excerpt_chars: self.excerpt_chars,
        }
    }

    /// Destination for the selected channel. The log channel needs none.
    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or("log")
    }

    pub fn credential(&self, source: &str) -> Option<String> {
        self.source_credentials.get(&source.to_lowercase()).cloned()
    }

    /// The four live listing collectors, in fixed discovery order.
    pub fn build_collectors(&self) -> Result<Vec<Box<dyn SourceCollector>>> {
        let client = http_client(self.collector_timeout())?;
        let (q, iq, loc) = (
            self.search_query.as_str(),
            self.internship_query.as_str(),
            self.search_location.as_str(),
        );
        Ok(vec![
            Box::new(LinkedInCollector::new(
                client.clone(),
                q,
                loc,
                self.credential("linkedin"),
            )),
            Box::new(IndeedCollector::new(
                client.clone(),
                q,
                loc,
                self.credential("indeed"),
            )),
            Box::new(NaukriCollector::new(
                client.clone(),
                q,
                loc,
                self.credential("naukri"),
            )),
            Box::new(InternshalaCollector::new(
                client,
                iq,
                loc,
                self.credential("internshala"),
            )),
        ])
    }

    pub fn build_notifier(&self) -> Result<Box<dyn Notifier>> {
        Ok(match self.channel {
            Channel::Telegram => {
                let token = self
                    .telegram_token
                    .clone()
                    .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
                Box::new(TelegramNotifier::new(token))
            }
            Channel::Email => Box::new(EmailNotifier::from_env()?),
            Channel::Log => Box::new(DryRunNotifier),
        })
    }
}
