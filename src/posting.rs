// src/posting.rs
//! Normalized posting record. Every raw card a collector returns is coerced into
//! a [`Posting`] before any scoring happens; later stages wrap it in a
//! [`ScoredPosting`] instead of editing it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::collect::types::RawPosting;

/// When the posting went up, as far as the source tells us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PostedAt {
    Timestamp(DateTime<Utc>),
    /// Source-provided relative text, e.g. "2 days ago", "Just posted".
    Relative(String),
    #[default]
    Unknown,
}

impl PostedAt {
    /// Age in whole days at `now`, or `None` when it cannot be determined.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            PostedAt::Timestamp(ts) => Some(now.signed_duration_since(*ts).num_days().max(0)),
            PostedAt::Relative(text) => parse_relative_age(text),
            PostedAt::Unknown => None,
        }
    }
}

/// Heuristic parse of relative age strings ("3 days ago", "1 week ago", "today").
pub fn parse_relative_age(text: &str) -> Option<i64> {
    static RE_AMOUNT: OnceCell<Regex> = OnceCell::new();
    let re = RE_AMOUNT.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\+?\s*(minute|min|hour|hr|day|week|month|year|yr)s?\b").unwrap()
    });

    let t = text.trim().to_ascii_lowercase();
    if t.is_empty() {
        return None;
    }

    if let Some(caps) = re.captures(&t) {
        let n: i64 = caps[1].parse().ok()?;
        return Some(match &caps[2] {
            "minute" | "min" | "hour" | "hr" => 0,
            "day" => n,
            "week" => n.saturating_mul(7),
            "month" => n.saturating_mul(30),
            _ => n.saturating_mul(365),
        });
    }

    if t.contains("yesterday") {
        return Some(1);
    }
    if ["today", "just", "hour", "minute", "second"]
        .iter()
        .any(|w| t.contains(w))
        || t.split(|c: char| !c.is_alphanumeric()).any(|w| w == "now")
    {
        return Some(0);
    }
    None
}

/// Why a raw card could not become a [`Posting`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPosting {
    #[error("posting from {site} has no title")]
    MissingTitle { site: String },
    #[error("posting `{title}` from {site} has neither id, apply url nor company")]
    MissingIdentity { site: String, title: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub identifier: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub source: String,
    pub description: String,
    pub apply_url: Option<String>,
    pub apply_hint: Option<String>,
    pub posted_at: PostedAt,
}

impl Posting {
    pub fn from_raw(raw: RawPosting) -> Result<Self, MalformedPosting> {
        let source = clean_text(&raw.source);
        let title = clean_opt(raw.title).ok_or_else(|| MalformedPosting::MissingTitle {
            site: source.clone(),
        })?;
        let company = clean_opt(raw.company).unwrap_or_default();
        let apply_url = clean_opt(raw.apply_url);
        let source_id = clean_opt(raw.source_id);

        let identifier = posting_identifier(
            &source,
            source_id.as_deref().or(apply_url.as_deref()),
            &title,
            &company,
        )
        .ok_or_else(|| MalformedPosting::MissingIdentity {
            site: source.clone(),
            title: title.clone(),
        })?;

        let description = clean_opt(raw.description).unwrap_or_default();

        Ok(Self {
            identifier,
            title,
            company,
            location: clean_opt(raw.location).unwrap_or_default(),
            source,
            description,
            apply_url,
            apply_hint: clean_opt(raw.apply_hint),
            posted_at: raw.posted_at,
        })
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.posted_at.age_days(now)
    }

    /// Lower-cased `title + description`, the text the scorer and classifier read.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Source-qualified dedup key.
///
/// A source-provided id (or apply url) wins; otherwise the key is a short
/// SHA-256 over the normalized title and company. Returns `None` when there is
/// nothing stable to key on.
pub fn posting_identifier(
    source: &str,
    source_id: Option<&str>,
    title: &str,
    company: &str,
) -> Option<String> {
    let src = source.trim().to_lowercase();

    if let Some(id) = source_id.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(format!("{src}:{id}"));
    }

    let company = collapse_lower(company);
    if company.is_empty() {
        return None;
    }
    let material = format!("{}|{}", collapse_lower(title), company);
    let digest = Sha256::digest(material.as_bytes());
    let mut hex = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    Some(format!("{src}:{hex}"))
}

fn collapse_lower(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn clean_opt(s: Option<String>) -> Option<String> {
    s.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}

/// Markup to plain text: strip tags, then [`clean_text`].
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    clean_text(&re_tags.replace_all(s, " "))
}

/// Tidy text that is already plain: decode stray entities, ASCII quotes,
/// collapse whitespace. A literal `<` or `>` survives.
pub fn clean_text(s: &str) -> String {
    let out = html_escape::decode_html_entities(s)
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Fresher,
    Junior,
    Mid,
    Senior,
    Unknown,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperienceLevel::Fresher => "Fresher/Entry",
            ExperienceLevel::Junior => "Junior (0-2 yrs)",
            ExperienceLevel::Mid => "Mid (2-5 yrs)",
            ExperienceLevel::Senior => "Senior (5+ yrs)",
            ExperienceLevel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyMethod {
    EasyApply,
    ExternalRedirect,
    Unknown,
}

impl fmt::Display for ApplyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyMethod::EasyApply => "Easy Apply (on the listing site)",
            ApplyMethod::ExternalRedirect => "External apply (company site)",
            ApplyMethod::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A posting plus the fields derived during the Scoring stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPosting {
    pub posting: Posting,
    pub score: u32,
    pub matched_terms: BTreeSet<String>,
    pub experience: ExperienceLevel,
    pub apply_method: ApplyMethod,
}
