// src/collect/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::posting::PostedAt;

/// One card as a collector scraped it. Everything but `source` is optional so
/// that incomplete cards surface as malformed postings in the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawPosting {
    pub source: String, // e.g. "LinkedIn", "Internshala"
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub apply_url: Option<String>,
    pub apply_hint: Option<String>, // e.g. "Easy Apply"
    #[serde(default)]
    pub posted_at: PostedAt,
}

#[async_trait::async_trait]
pub trait SourceCollector: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawPosting>>;
    fn name(&self) -> &'static str;
}
