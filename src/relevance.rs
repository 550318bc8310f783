// src/relevance.rs
//! Relevance scoring: keyword profile (config types + TOML loading) and the
//! additive scorer.
//!
//! Matching is case-insensitive substring search over `title + description`.
//! There is no stemming and no word-boundary check, so "aws" also matches
//! inside "laws". Each distinct keyword counts once, however often it occurs.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::posting::Posting;

// --- env defaults & names ---
pub const DEFAULT_KEYWORD_PROFILE_PATH: &str = "config/keywords.toml";
pub const ENV_KEYWORD_PROFILE_PATH: &str = "KEYWORD_PROFILE_PATH";

/// Result of relevance evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    pub score: u32,
    pub matched: BTreeSet<String>,
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Weights {
    #[serde(default = "default_role_weight")]
    pub role: u32,
    #[serde(default = "default_skill_weight")]
    pub skill: u32,
    #[serde(default = "default_internship_weight")]
    pub internship: u32,
}

fn default_role_weight() -> u32 {
    3
}
fn default_skill_weight() -> u32 {
    1
}
fn default_internship_weight() -> u32 {
    2
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            role: default_role_weight(),
            skill: default_skill_weight(),
            internship: default_internship_weight(),
        }
    }
}

/// The skill/role profile postings are scored against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordProfile {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub internship: Vec<String>,
    /// Show the internship marker among matched terms.
    #[serde(default)]
    pub internship_in_matched: bool,
    #[serde(default)]
    pub weights: Weights,
    /// Flat points per source, keyed case-insensitively.
    #[serde(default)]
    pub source_boost: HashMap<String, u32>,
}

impl KeywordProfile {
    /// Load from a TOML string; keywords are trimmed, lower-cased and deduplicated.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: KeywordProfile = toml::from_str(toml_str)?;
        Ok(raw.cleaned())
    }

    /// Load from `path` (or `$KEYWORD_PROFILE_PATH`, or `config/keywords.toml`).
    /// A missing file falls back to [`KeywordProfile::default_seed`]; a file that
    /// exists but does not parse is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::var(ENV_KEYWORD_PROFILE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYWORD_PROFILE_PATH))
        });

        if !path.exists() {
            debug!(path = %path.display(), "no keyword profile file; using built-in seed");
            return Ok(Self::default_seed());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read keyword profile at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("keyword profile {}: {}", path.display(), e))
    }

    /// Built-in DevOps / cloud profile.
    pub fn default_seed() -> Self {
        let roles = [
            "devops engineer",
            "associate devops",
            "cloud engineer",
            "devops intern",
            "cloud devops",
            "site reliability",
            "sre",
            "infrastructure engineer",
            "platform engineer",
        ];
        let skills = [
            "aws",
            "gcp",
            "google cloud",
            "azure",
            "docker",
            "docker-compose",
            "kubernetes",
            "k8s",
            "ci/cd",
            "github actions",
            "gitlab",
            "jenkins",
            "terraform",
            "ansible",
            "infrastructure as code",
            "linux",
            "bash",
            "shell scripting",
            "python",
            "nginx",
            "apache",
            "prometheus",
            "grafana",
        ];
        let internship = ["intern", "internship", "trainee"];

        let source_boost = ["linkedin", "indeed", "naukri", "internshala"]
            .into_iter()
            .map(|s| (s.to_string(), 1))
            .collect();

        Self {
            roles: roles.iter().map(|s| s.to_string()).collect(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            internship: internship.iter().map(|s| s.to_string()).collect(),
            internship_in_matched: false,
            weights: Weights::default(),
            source_boost,
        }
    }

    fn cleaned(self) -> Self {
        Self {
            roles: clean_list(self.roles),
            skills: clean_list(self.skills),
            internship: clean_list(self.internship),
            source_boost: self
                .source_boost
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
            ..self
        }
    }
}

/// Trim + lower-case + dedup, keeping first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/* ----------------------------
Scorer
---------------------------- */

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    profile: KeywordProfile,
}

impl RelevanceScorer {
    pub fn new(profile: KeywordProfile) -> Self {
        Self {
            profile: profile.cleaned(),
        }
    }

    pub fn score(&self, posting: &Posting) -> Relevance {
        let text = posting.search_text();
        self.score_text(&text, &posting.source)
    }

    /// Score already-concatenated text for a given source.
    pub fn score_text(&self, text: &str, source: &str) -> Relevance {
        let text = text.to_lowercase();
        let w = self.profile.weights;
        let mut rel = Relevance::default();

        for r in self.profile.roles.iter().filter(|r| text.contains(r.as_str())) {
            rel.score = rel.score.saturating_add(w.role);
            rel.matched.insert(r.clone());
        }

        for s in self.profile.skills.iter().filter(|s| text.contains(s.as_str())) {
            rel.score = rel.score.saturating_add(w.skill);
            rel.matched.insert(s.clone());
        }

        if self
            .profile
            .internship
            .iter()
            .any(|k| text.contains(k.as_str()))
        {
            rel.score = rel.score.saturating_add(w.internship);
            if self.profile.internship_in_matched {
                rel.matched.insert("intern".to_string());
            }
        }

        rel.score = rel.score.saturating_add(self.source_boost(source));

        debug!(
            target: "relevance",
            source,
            score = rel.score,
            matched = ?rel.matched,
            "scored"
        );
        rel
    }

    pub fn source_boost(&self, source: &str) -> u32 {
        self.profile
            .source_boost
            .get(&source.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

/* ----------------------------
Tests
---------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::types::RawPosting;

    fn posting(title: &str, description: &str, source: &str) -> Posting {
        Posting::from_raw(RawPosting {
            source: source.into(),
            title: Some(title.into()),
            company: Some("Acme".into()),
            description: Some(description.into()),
            ..RawPosting::default()
        })
        .expect("valid posting")
    }

    fn seed() -> RelevanceScorer {
        RelevanceScorer::new(KeywordProfile::default_seed())
    }

    #[test]
    fn documented_example_scores_seven() {
        let p = posting(
            "DevOps Engineer",
            "Built CI/CD pipelines using AWS and Docker",
            "LinkedIn",
        );
        let r = seed().score(&p);
        assert_eq!(r.score, 7);
        let expected: BTreeSet<String> = ["devops engineer", "aws", "docker", "ci/cd"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(r.matched, expected);
    }

    #[test]
    fn angle_brackets_do_not_hide_keywords() {
        let p = posting(
            "Backend Developer",
            "Experience <3 years with aws and docker, salary > 10 LPA",
            "Other",
        );
        let r = seed().score(&p);
        assert_eq!(r.score, 2);
        assert!(r.matched.contains("aws") && r.matched.contains("docker"));
    }

    #[test]
    fn keyword_deep_in_a_long_description_counts() {
        let p = posting(
            "Backend Developer",
            &format!("{} terraform", "x".repeat(4100)),
            "Other",
        );
        assert_eq!(seed().score(&p).score, 1);
    }

    #[test]
    fn huge_weights_saturate() {
        let mut p = KeywordProfile::default_seed();
        p.weights.role = u32::MAX;
        p.weights.skill = u32::MAX;
        let r = RelevanceScorer::new(p).score_text("devops engineer with aws", "LinkedIn");
        assert_eq!(r.score, u32::MAX);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let s = seed();
        let once = s.score_text("aws", "Other");
        let many = s.score_text("aws aws AWS aws", "Other");
        assert_eq!(once.score, 1);
        assert_eq!(many.score, 1);
    }

    #[test]
    fn internship_bonus_applies_once_and_is_hidden_by_default() {
        let s = seed();
        let r = s.score_text("summer internship for an intern trainee", "Other");
        assert_eq!(r.score, 2);
        assert!(r.matched.is_empty());
    }

    #[test]
    fn internship_marker_can_be_shown() {
        let mut p = KeywordProfile::default_seed();
        p.internship_in_matched = true;
        let r = RelevanceScorer::new(p).score_text("trainee", "Other");
        assert_eq!(r.score, 2);
        assert!(r.matched.contains("intern"));
    }

    #[test]
    fn substring_match_has_no_word_boundary() {
        let r = seed().score_text("labour laws apply", "Other");
        assert!(r.matched.contains("aws"));
    }

    #[test]
    fn source_boost_is_case_insensitive_and_not_matched() {
        let s = seed();
        assert_eq!(s.score_text("", "LinkedIn").score, 1);
        assert_eq!(s.score_text("", "INTERNSHALA").score, 1);
        assert_eq!(s.score_text("", "Monster").score, 0);
        assert!(s.score_text("", "LinkedIn").matched.is_empty());
    }

    #[test]
    fn unrelated_text_scores_zero() {
        let r = seed().score_text("barista wanted for a busy cafe", "Other");
        assert_eq!(r, Relevance::default());
    }

    #[test]
    fn toml_profile_is_cleaned_and_weighted() {
        const TOML: &str = r#"
roles = [" Data Engineer ", "data engineer"]
skills = ["Spark", "", "SQL"]
internship = ["intern"]

[weights]
role = 5

[source_boost]
" Indeed " = 2
"#;
        let p = KeywordProfile::from_toml_str(TOML).unwrap();
        assert_eq!(p.roles, vec!["data engineer".to_string()]);
        assert_eq!(p.skills, vec!["spark".to_string(), "sql".to_string()]);
        assert_eq!(p.weights.skill, 1, "unset weights keep defaults");

        let r = RelevanceScorer::new(p).score_text("Data Engineer with Spark and SQL", "indeed");
        assert_eq!(r.score, 5 + 1 + 1 + 2);
    }

    #[test]
    fn missing_profile_file_falls_back_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let p = KeywordProfile::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(p, KeywordProfile::default_seed());
    }

    #[test]
    fn broken_profile_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.toml");
        fs::write(&path, "roles = [").unwrap();
        assert!(KeywordProfile::load(Some(&path)).is_err());
    }
}
