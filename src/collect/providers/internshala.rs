// src/collect/providers/internshala.rs
use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use super::{absolutize, first_attr, first_text, selector, HttpSource, Mode};
use crate::collect::types::{RawPosting, SourceCollector};
use crate::posting::PostedAt;

const BASE_URL: &str = "https://internshala.com";

/// Internshala internships. Applications always go through Internshala itself.
pub struct InternshalaCollector {
    mode: Mode,
}

impl InternshalaCollector {
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
                url: format!("{BASE_URL}/internships"),
                params: vec![
                    ("q".into(), query.to_string()),
                    ("location".into(), location.to_string()),
                ],
                credential,
            }),
        }
    }

    pub fn parse_cards(html: &str) -> Result<Vec<RawPosting>> {
        let doc = Html::parse_document(html);
        let card = selector("div.individual_internship")?;
        let title = selector("h3.heading_4_5, h3.job-internship-name")?;
        let company = selector("p.company_name, .company-name")?;
        let link = selector("a.view_detail_button, a.job-title-href")?;
        let location = selector("#location_names, .locations")?;
        let posted = selector(".status-inactive, .status-success, .status-info")?;

        let mut out = Vec::new();
        for c in doc.select(&card) {
            let (Some(t), Some(co), Some(href)) = (
                first_text(&c, &title),
                first_text(&c, &company),
                first_attr(&c, &link, "href"),
            ) else {
                continue;
            };
            out.push(RawPosting {
                source: "Internshala".to_string(),
                source_id: c
                    .value()
                    .attr("internshipid")
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                title: Some(t),
                company: Some(co),
                location: first_text(&c, &location),
                description: None,
                apply_url: Some(absolutize(BASE_URL, &href)),
                apply_hint: Some("Apply on Internshala".to_string()),
                posted_at: first_text(&c, &posted)
                    .map(PostedAt::Relative)
                    .unwrap_or_default(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceCollector for InternshalaCollector {
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
        "Internshala"
    }
}
