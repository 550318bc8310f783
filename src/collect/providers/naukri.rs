// src/collect/providers/naukri.rs
use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use super::{first_attr, first_text, selector, HttpSource, Mode};
use crate::collect::types::{RawPosting, SourceCollector};
use crate::posting::PostedAt;

const BASE_URL: &str = "https://www.naukri.com";

pub struct NaukriCollector {
    mode: Mode,
}

impl NaukriCollector {
    pub fn from_html(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
        }
    }

    /// Naukri keys searches by path: "DevOps Engineer" → `/devops-engineer-jobs`.
    pub fn new(
        client: reqwest::Client,
        query: &str,
        location: &str,
        credential: Option<String>,
    ) -> Self {
        let slug = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        Self {
            mode: Mode::Http(HttpSource {
                client,
                url: format!("{BASE_URL}/{slug}-jobs"),
                params: vec![("l".into(), location.to_string())],
                credential,
            }),
        }
    }

    pub fn parse_cards(html: &str) -> Result<Vec<RawPosting>> {
        let doc = Html::parse_document(html);
        let card = selector("article.jobTuple, div.srp-jobtuple-wrapper")?;
        let title = selector("a.title")?;
        let company = selector("a.subTitle, a.comp-name")?;
        let location = selector("li.location, span.locWdth")?;
        let desc = selector("div.job-description, span.job-desc")?;
        let posted = selector("span.job-post-day, div.postedDate, span.fleft.postedDate")?;

        let mut out = Vec::new();
        for c in doc.select(&card) {
            // title and company are both required on Naukri cards
            let (Some(t), Some(co)) = (first_text(&c, &title), first_text(&c, &company)) else {
                continue;
            };
            out.push(RawPosting {
                source: "Naukri".to_string(),
                source_id: c
                    .value()
                    .attr("data-job-id")
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                title: Some(t),
                company: Some(co),
                location: first_text(&c, &location),
                description: first_text(&c, &desc),
                apply_url: first_attr(&c, &title, "href"),
                apply_hint: None,
                posted_at: first_text(&c, &posted)
                    .map(PostedAt::Relative)
                    .unwrap_or_default(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceCollector for NaukriCollector {
    async fn fetch(&self) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_cards(s),
            Mode::Http(src) => {
                let body = src.get_page(&[]).await?;
                Self::parse_cards(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Naukri"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<section>
  <article class="jobTuple" data-job-id="150925000123">
    <a class="title" href="https://www.naukri.com/job-listings-devops-intern-150925000123">DevOps Intern</a>
    <a class="subTitle">Hooli</a>
    <ul><li class="location">Hyderabad</li></ul>
    <div class="job-description">Linux, Jenkins, Docker basics. Freshers welcome.</div>
    <span class="job-post-day">Just Now</span>
  </article>
  <article class="jobTuple">
    <a class="title" href="/x">Orphan title</a>
  </article>
</section>"#;

    #[test]
    fn parses_cards_from_fixture() {
        let cards = NaukriCollector::parse_cards(FIXTURE).unwrap();
        assert_eq!(cards.len(), 1, "card without company is skipped");
        let c = &cards[0];
        assert_eq!(c.source_id.as_deref(), Some("150925000123"));
        assert_eq!(c.company.as_deref(), Some("Hooli"));
        assert_eq!(c.location.as_deref(), Some("Hyderabad"));
        assert_eq!(c.apply_hint, None);
        assert_eq!(c.posted_at, PostedAt::Relative("Just Now".into()));
    }

    #[test]
    fn query_becomes_path_slug() {
        let c = NaukriCollector::new(reqwest::Client::new(), "DevOps  Engineer", "India", None);
        let Mode::Http(src) = &c.mode else {
            panic!("expected http mode");
        };
        assert_eq!(src.url, "https://www.naukri.com/devops-engineer-jobs");
    }
}
