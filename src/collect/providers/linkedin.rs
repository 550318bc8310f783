// src/collect/providers/linkedin.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use scraper::Html;

use super::{card_text_lower, first_attr, first_text, selector, HttpSource, Mode};
use crate::collect::types::{RawPosting, SourceCollector};
use crate::posting::PostedAt;

const BASE_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const PAGE_SIZE: usize = 25;

/// LinkedIn guest job search (no login; HTML list items).
pub struct LinkedInCollector {
    mode: Mode,
    pages: usize,
}

impl LinkedInCollector {
    pub fn from_html(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
            pages: 1,
        }
    }

    pub fn new(
        client: reqwest::Client,
        query: &str,
        location: &str,
        credential: Option<String>,
    ) -> Self {
        Self {
            mode: Mode::Http(HttpSource {
                client,
                url: BASE_URL.to_string(),
                params: vec![
                    ("keywords".into(), query.to_string()),
                    ("location".into(), location.to_string()),
                ],
                credential,
            }),
            pages: 2,
        }
    }

    pub fn parse_cards(html: &str) -> Result<Vec<RawPosting>> {
        let doc = Html::parse_document(html);
        let card = selector("li")?;
        let base_card = selector("div.base-card, div.base-search-card")?;
        let title = selector(".base-search-card__title")?;
        let company = selector(".base-search-card__subtitle")?;
        let location = selector(".job-search-card__location")?;
        let link = selector("a.base-card__full-link")?;
        let time = selector("time")?;

        let mut out = Vec::new();
        for li in doc.select(&card) {
            let Some(t) = first_text(&li, &title) else {
                continue;
            };

            let source_id = first_attr(&li, &base_card, "data-entity-urn")
                .and_then(|urn| urn.rsplit(':').next().map(str::to_string));

            let posted_at = match (
                first_attr(&li, &time, "datetime"),
                first_text(&li, &time),
            ) {
                (Some(dt), text) => parse_datetime(&dt)
                    .map(PostedAt::Timestamp)
                    .or(text.map(PostedAt::Relative))
                    .unwrap_or_default(),
                (None, Some(text)) => PostedAt::Relative(text),
                (None, None) => PostedAt::Unknown,
            };

            let apply_hint = card_text_lower(&li)
                .contains("easy apply")
                .then(|| "Easy Apply".to_string());

            out.push(RawPosting {
                source: "LinkedIn".to_string(),
                source_id,
                title: Some(t),
                company: first_text(&li, &company),
                location: first_text(&li, &location),
                description: None,
                apply_url: first_attr(&li, &link, "href").map(strip_tracking),
                apply_hint,
                posted_at,
            });
        }
        Ok(out)
    }
}

/// `<time datetime>` is either a plain date or a full RFC 3339 stamp.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Guest links carry per-request tracking params; drop them so the url is stable.
fn strip_tracking(url: String) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url,
    }
}

#[async_trait]
impl SourceCollector for LinkedInCollector {
    async fn fetch(&self) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_cards(s),
            Mode::Http(src) => {
                let mut out = Vec::new();
                for page in 0..self.pages {
                    let start = (page * PAGE_SIZE).to_string();
                    let body = match src.get_page(&[("start", start)]).await {
                        Ok(b) => b,
                        Err(e) if page > 0 => {
                            tracing::warn!(error = ?e, collector = "LinkedIn", page, "stopping pagination");
                            counter!("scout_collector_errors_total").increment(1);
                            break;
                        }
                        Err(e) => return Err(e),
                    };
                    let mut cards = Self::parse_cards(&body)?;
                    if cards.is_empty() {
                        break;
                    }
                    out.append(&mut cards);
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "LinkedIn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<ul>
  <li>
    <div class="base-card base-search-card" data-entity-urn="urn:li:jobPosting:3712345678">
      <a class="base-card__full-link" href="https://in.linkedin.com/jobs/view/devops-engineer-3712345678?refId=abc&amp;trackingId=xyz"></a>
      <h3 class="base-search-card__title"> DevOps Engineer </h3>
      <h4 class="base-search-card__subtitle"><a>Acme Cloud</a></h4>
      <span class="job-search-card__location">Bengaluru, Karnataka, India</span>
      <span class="job-posting-benefits__text">Easy Apply</span>
      <time class="job-search-card__listdate" datetime="2025-09-08">2 days ago</time>
    </div>
  </li>
  <li>
    <div class="base-card" data-entity-urn="urn:li:jobPosting:3799999999">
      <h3 class="base-search-card__title">Site Reliability Engineer</h3>
      <h4 class="base-search-card__subtitle">Globex</h4>
      <time>1 week ago</time>
    </div>
  </li>
  <li><div class="ad">sponsored</div></li>
</ul>"#;

    #[test]
    fn parses_cards_from_fixture() {
        let cards = LinkedInCollector::parse_cards(FIXTURE).unwrap();
        assert_eq!(cards.len(), 2, "the card without a title is skipped");

        let first = &cards[0];
        assert_eq!(first.source, "LinkedIn");
        assert_eq!(first.source_id.as_deref(), Some("3712345678"));
        assert_eq!(first.title.as_deref(), Some("DevOps Engineer"));
        assert_eq!(first.company.as_deref(), Some("Acme Cloud"));
        assert_eq!(
            first.apply_url.as_deref(),
            Some("https://in.linkedin.com/jobs/view/devops-engineer-3712345678")
        );
        assert_eq!(first.apply_hint.as_deref(), Some("Easy Apply"));
        assert!(matches!(first.posted_at, PostedAt::Timestamp(_)));

        let second = &cards[1];
        assert_eq!(second.apply_hint, None);
        assert_eq!(second.posted_at, PostedAt::Relative("1 week ago".into()));
    }

    #[test]
    fn datetime_formats() {
        assert!(parse_datetime("2025-09-08").is_some());
        assert!(parse_datetime("2025-09-08T10:00:00Z").is_some());
        assert!(parse_datetime("last week").is_none());
    }

    #[tokio::test]
    async fn fixture_mode_fetches() {
        let c = LinkedInCollector::from_html(FIXTURE);
        assert_eq!(c.fetch().await.unwrap().len(), 2);
        assert_eq!(c.name(), "LinkedIn");
    }
}
