// src/classify.rs
//! Experience level and application method tagging. Pure functions, never fail.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::posting::{ApplyMethod, ExperienceLevel, Posting};

/// Level indicators in precedence order; the first level with a hit wins.
fn level_patterns() -> &'static [(ExperienceLevel, Regex)] {
    static PATTERNS: OnceCell<Vec<(ExperienceLevel, Regex)>> = OnceCell::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                ExperienceLevel::Senior,
                Regex::new(
                    r"(?i)\b(senior|lead|principal|staff)\b|\bsr\.|\b([5-9]|1\d)\+ ?(years?|yrs?)\b",
                )
                .unwrap(),
            ),
            (
                ExperienceLevel::Mid,
                Regex::new(r"(?i)\b(mid[- ]level|experienced)\b|\b[23] ?- ?5 (years?|yrs?)\b")
                    .unwrap(),
            ),
            (
                ExperienceLevel::Junior,
                Regex::new(r"(?i)\b(junior|associate)\b|\bjr\.|\b[01] ?- ?[23] (years?|yrs?)\b")
                    .unwrap(),
            ),
            (
                ExperienceLevel::Fresher,
                Regex::new(
                    r"(?i)\b(freshers?|entry[- ]level|interns?|internships?|trainees?|graduates?)\b|\b0 ?- ?1 (years?|yrs?)\b|\b0 ?- ?6 months?\b",
                )
                .unwrap(),
            ),
        ]
    })
}

/// First "N years" / "N-M years" / "N+ yrs" expression, lower bound only.
fn years_lower_bound(text: &str) -> Option<u32> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:(?:-|–|to)\s*\d{1,2}\s*)?(?:years?|yrs?)\b").unwrap()
    });
    re.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn classify_experience(text: &str) -> ExperienceLevel {
    for (level, re) in level_patterns() {
        if re.is_match(text) {
            return *level;
        }
    }
    match years_lower_bound(text) {
        Some(0..=1) => ExperienceLevel::Fresher,
        Some(2) => ExperienceLevel::Junior,
        Some(3..=5) => ExperienceLevel::Mid,
        Some(_) => ExperienceLevel::Senior,
        None => ExperienceLevel::Unknown,
    }
}

/// Hint phrases that mean the application happens on the listing site itself.
pub const IN_PLATFORM_MARKERS: &[&str] = &[
    "easy apply",
    "easy-apply",
    "easily apply",
    "quick apply",
    "in-platform",
    "apply on linkedin",
    "apply on indeed",
    "apply on naukri",
    "apply on internshala",
];

pub fn classify_apply(hint: Option<&str>) -> ApplyMethod {
    let Some(h) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
        return ApplyMethod::Unknown;
    };
    let h = h.to_lowercase();
    if IN_PLATFORM_MARKERS.iter().any(|m| h.contains(m)) {
        ApplyMethod::EasyApply
    } else {
        ApplyMethod::ExternalRedirect
    }
}

/// Both tags for a posting.
pub fn classify(posting: &Posting) -> (ExperienceLevel, ApplyMethod) {
    (
        classify_experience(&posting.search_text()),
        classify_apply(posting.apply_hint.as_deref()),
    )
}
