// tests/providers_fixtures.rs
//
// The four listing collectors over saved result pages, gathered together and
// then pushed through a full cycle.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use job_scout::collect::gather;
use job_scout::collect::providers::{
    indeed::IndeedCollector, internshala::InternshalaCollector, linkedin::LinkedInCollector,
    naukri::NaukriCollector,
};
use job_scout::{
    KeywordProfile, Notifier, Pipeline, PipelineSettings, RelevanceScorer, SeenStore,
    SourceCollector,
};

const LINKEDIN: &str = include_str!("fixtures/linkedin.html");
const INDEED: &str = include_str!("fixtures/indeed.html");
const NAUKRI: &str = include_str!("fixtures/naukri.html");
const INTERNSHALA: &str = include_str!("fixtures/internshala.html");

fn collectors() -> Vec<Box<dyn SourceCollector>> {
    vec![
        Box::new(LinkedInCollector::from_html(LINKEDIN)),
        Box::new(IndeedCollector::from_html(INDEED)),
        Box::new(NaukriCollector::from_html(NAUKRI)),
        Box::new(InternshalaCollector::from_html(INTERNSHALA)),
    ]
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

#[async_trait::async_trait]
impl Notifier for Inbox {
    async fn deliver(&self, message: &str, _recipient: &str) -> Result<()> {
        self.0.lock().push(message.to_string());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "inbox"
    }
}

#[tokio::test]
async fn gather_reads_every_fixture_in_collector_order() {
    let g = gather(&collectors(), None).await;
    assert!(g.failures.is_empty(), "{:?}", g.failures);

    let sources: Vec<_> = g.postings.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(
        sources,
        vec!["LinkedIn", "LinkedIn", "Indeed", "Naukri", "Internshala"]
    );

    let indeed = &g.postings[2];
    assert_eq!(
        indeed.apply_url.as_deref(),
        Some("https://in.indeed.com/rc/clk?jk=a1b2c3&from=serp")
    );
    assert_eq!(indeed.apply_hint.as_deref(), Some("Apply on company site"));

    let internshala = &g.postings[4];
    assert_eq!(internshala.location.as_deref(), Some("Bangalore"));
    assert_eq!(
        internshala.apply_url.as_deref(),
        Some("https://internshala.com/internship/detail/devops-internship-in-bangalore-at-pied-piper1694001234")
    );
}

#[tokio::test]
async fn fixture_cycle_scores_orders_and_tags() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = Inbox::default();
    let mut p = Pipeline::new(
        collectors(),
        RelevanceScorer::new(KeywordProfile::default_seed()),
        Box::new(inbox.clone()),
        SeenStore::empty(dir.path().join("seen.json")),
        PipelineSettings::default(),
    );

    let r = p.run_cycle(now()).await;
    assert_eq!(r.gathered, 5);
    assert_eq!(r.too_old, 1, "the three-week-old LinkedIn card");
    assert_eq!(
        r.delivered,
        vec![
            "indeed:a1b2c3",
            "naukri:190925001",
            "internshala:2881234",
            "linkedin:3712345678",
        ]
    );

    let msgs = inbox.0.lock();
    // Indeed: cloud engineer + terraform + kubernetes + aws + boost
    assert!(msgs[0].contains("High match (score 7)"));
    assert!(msgs[0].contains("<b>Experience:</b> Junior (0-2 yrs)"));
    assert!(msgs[0].contains("<b>How to apply:</b> External apply (company site)"));
    assert!(msgs[0].contains("<i>Indeed</i> • 3 days ago"));

    assert!(msgs[1].contains("<b>Experience:</b> Fresher/Entry"));
    assert!(msgs[1].contains("<b>How to apply:</b> Unknown"));

    assert!(msgs[2].contains("High match (score 6)"));
    assert!(msgs[2].contains("<b>How to apply:</b> Easy Apply (on the listing site)"));
    assert!(msgs[2].contains("• Just now"));

    assert!(msgs[3].contains("Good match (score 4)"));
    assert!(msgs[3].contains("Acme Cloud — Bengaluru, Karnataka, India"));
    assert!(msgs[3].contains("<i>LinkedIn</i> • 2 days ago"));
    assert!(msgs[3].contains(
        "href=\"https://in.linkedin.com/jobs/view/devops-engineer-at-acme-cloud-3712345678\""
    ));
}
