// src/collect/providers/indeed.rs
use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use super::{absolutize, card_text_lower, first_attr, first_text, selector, HttpSource, Mode};
use crate::collect::types::{RawPosting, SourceCollector};
use crate::posting::PostedAt;

const BASE_URL: &str = "https://in.indeed.com";

pub struct IndeedCollector {
    mode: Mode,
}

impl IndeedCollector {
    pub fn from_html(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
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
                url: format!("{BASE_URL}/jobs"),
                params: vec![
                    ("q".into(), query.to_string()),
                    ("l".into(), location.to_string()),
                    ("fromage".into(), "7".into()),
                ],
                credential,
            }),
        }
    }

    pub fn parse_cards(html: &str) -> Result<Vec<RawPosting>> {
        let doc = Html::parse_document(html);
        let card = selector("div.job_seen_beacon")?;
        let title = selector("h2.jobTitle")?;
        let company = selector("span.companyName, [data-testid='company-name']")?;
        let location = selector("div.companyLocation, [data-testid='text-location']")?;
        let snippet = selector("div.job-snippet")?;
        let date = selector("span.date")?;
        let link = selector("a")?;

        let mut out = Vec::new();
        for c in doc.select(&card) {
            let Some(t) = first_text(&c, &title) else {
                continue;
            };
            let href = first_attr(&c, &link, "href");
            let text = card_text_lower(&c);
            let apply_hint = if text.contains("easily apply") {
                "Easily apply"
            } else {
                "Apply on company site"
            };

            out.push(RawPosting {
                source: "Indeed".to_string(),
                source_id: first_attr(&c, &link, "data-jk"),
                title: Some(t),
                company: first_text(&c, &company),
                location: first_text(&c, &location),
                description: first_text(&c, &snippet),
                apply_url: href.map(|h| absolutize(BASE_URL, &h)),
                apply_hint: Some(apply_hint.to_string()),
                posted_at: first_text(&c, &date)
                    .map(|d| PostedAt::Relative(d.trim_start_matches("Posted").trim().to_string()))
                    .unwrap_or_default(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceCollector for IndeedCollector {
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
        "Indeed"
    }
}
