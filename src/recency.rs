// src/recency.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::posting::Posting;

pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// What to do with postings whose age cannot be worked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAgePolicy {
    #[default]
    Keep,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyFilter {
    pub max_age_days: i64,
    pub unknown_age: UnknownAgePolicy,
}

impl Default for RecencyFilter {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            unknown_age: UnknownAgePolicy::Keep,
        }
    }
}

impl RecencyFilter {
    pub fn new(max_age_days: i64) -> Self {
        Self {
            max_age_days: max_age_days.max(0),
            ..Self::default()
        }
    }

    pub fn with_unknown_age(mut self, policy: UnknownAgePolicy) -> Self {
        self.unknown_age = policy;
        self
    }

    /// `true` keeps the posting. An age equal to `max_age_days` is kept.
    pub fn keep(&self, posting: &Posting, now: DateTime<Utc>) -> bool {
        match posting.age_days(now) {
            Some(age) => age <= self.max_age_days,
            None => self.unknown_age == UnknownAgePolicy::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::types::RawPosting;
    use crate::posting::PostedAt;
    use chrono::{Duration, TimeZone};

    fn aged(posted_at: PostedAt) -> Posting {
        Posting::from_raw(RawPosting {
            source: "Indeed".into(),
            title: Some("SRE".into()),
            company: Some("Acme".into()),
            posted_at,
            ..RawPosting::default()
        })
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn boundary_is_inclusive() {
        let f = RecencyFilter::default();
        let at_limit = aged(PostedAt::Timestamp(now() - Duration::days(7)));
        let past_limit = aged(PostedAt::Timestamp(now() - Duration::days(8)));
        assert!(f.keep(&at_limit, now()));
        assert!(!f.keep(&past_limit, now()));
    }

    #[test]
    fn relative_ages_are_filtered_too() {
        let f = RecencyFilter::new(7);
        assert!(f.keep(&aged(PostedAt::Relative("7 days ago".into())), now()));
        assert!(!f.keep(&aged(PostedAt::Relative("8 days ago".into())), now()));
        assert!(!f.keep(&aged(PostedAt::Relative("30+ days ago".into())), now()));
    }

    #[test]
    fn unknown_age_follows_policy() {
        let unknown = aged(PostedAt::Unknown);
        let unparseable = aged(PostedAt::Relative("recently".into()));
        let keep = RecencyFilter::default();
        let drop = RecencyFilter::default().with_unknown_age(UnknownAgePolicy::Drop);
        assert!(keep.keep(&unknown, now()));
        assert!(keep.keep(&unparseable, now()));
        assert!(!drop.keep(&unknown, now()));
        assert!(!drop.keep(&unparseable, now()));
    }
}
