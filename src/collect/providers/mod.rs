// src/collect/providers/mod.rs
//! HTML listing collectors. Each one either parses a fixed HTML string (tests,
//! offline runs) or fetches the live listing page with a browser-like client.

pub mod indeed;
pub mod internshala;
pub mod linkedin;
pub mod naukri;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Selector};

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36";

/// Shared client for listing pages.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .context("building listing http client")
}

pub(crate) enum Mode {
    Fixture(String),
    Http(HttpSource),
}

pub(crate) struct HttpSource {
    pub client: reqwest::Client,
    pub url: String,
    pub params: Vec<(String, String)>,
    /// Sent verbatim as the `Cookie` header when the source needs a session.
    pub credential: Option<String>,
}

impl HttpSource {
    pub async fn get_page(&self, extra: &[(&str, String)]) -> Result<String> {
        let mut req = self.client.get(&self.url).query(&self.params).query(extra);
        if let Some(c) = &self.credential {
            req = req.header(reqwest::header::COOKIE, c);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} for {}", status, self.url));
        }
        resp.text().await.context("reading listing body")
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("bad selector `{css}`: {e:?}"))
}

/// Trimmed text of the first descendant matching `sel`, if non-empty.
pub(crate) fn first_text(el: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|n| n.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

pub(crate) fn first_attr(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|n| n.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Full text of a card, lower-cased; used for marker detection.
pub(crate) fn card_text_lower(el: &ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Turn a site-relative href into an absolute url.
pub(crate) fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}
