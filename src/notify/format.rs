// src/notify/format.rs
//! Renders a [`ScoredPosting`] as an HTML-flavoured chat message. Field order is
//! fixed: title, company/location, source + age, excerpt, relevance, matched
//! terms, experience, how to apply, link. Pure, never fails.

use std::fmt;

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::posting::{PostedAt, ScoredPosting};

pub const DEFAULT_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub excerpt_chars: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

/// Human label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceTier {
    High,
    Good,
    Possible,
    Low,
}

impl RelevanceTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            6.. => RelevanceTier::High,
            3..=5 => RelevanceTier::Good,
            1..=2 => RelevanceTier::Possible,
            0 => RelevanceTier::Low,
        }
    }
}

impl fmt::Display for RelevanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelevanceTier::High => "High",
            RelevanceTier::Good => "Good",
            RelevanceTier::Possible => "Possible",
            RelevanceTier::Low => "Low",
        })
    }
}

pub fn format_message(sp: &ScoredPosting, now: DateTime<Utc>, opts: &FormatOptions) -> String {
    let p = &sp.posting;
    let mut lines: Vec<String> = Vec::with_capacity(12);

    lines.push(format!("<b>{}</b>", encode_text(&p.title)));
    lines.push(format!(
        "{} — {}",
        encode_text(or_na(&p.company)),
        encode_text(or_na(&p.location))
    ));
    lines.push(format!(
        "<i>{}</i> • {}",
        encode_text(&p.source),
        encode_text(&relative_age(&p.posted_at, now))
    ));

    let excerpt = excerpt(&p.description, opts.excerpt_chars);
    if !excerpt.is_empty() {
        lines.push(String::new());
        lines.push(encode_text(&excerpt).into_owned());
    }

    let matched = if sp.matched_terms.is_empty() {
        "—".to_string()
    } else {
        sp.matched_terms
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    lines.push(String::new());
    lines.push(format!(
        "<b>Relevance:</b> {} match (score {})",
        RelevanceTier::from_score(sp.score),
        sp.score
    ));
    lines.push(format!("<b>Matched:</b> {}", encode_text(&matched)));
    lines.push(format!("<b>Experience:</b> {}", sp.experience));
    lines.push(format!("<b>How to apply:</b> {}", sp.apply_method));

    if let Some(url) = p.apply_url.as_deref() {
        lines.push(String::new());
        lines.push(format!(
            "↪ <a href=\"{}\">View / Apply</a>",
            encode_double_quoted_attribute(url)
        ));
    }

    lines.join("\n")
}

/// "today", "1 day ago", "N days ago"; relative text is shown as the source gave it.
pub fn relative_age(posted_at: &PostedAt, now: DateTime<Utc>) -> String {
    match posted_at {
        PostedAt::Timestamp(_) => match posted_at.age_days(now) {
            Some(0) | None => "today".to_string(),
            Some(1) => "1 day ago".to_string(),
            Some(n) => format!("{n} days ago"),
        },
        PostedAt::Relative(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => "date unknown".to_string(),
    }
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        "N/A"
    } else {
        s
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
