//! Scoring Engine — pure per-posting computation of the three component
//! scores and their weighted combination.
//!
//! `(ParsedResume, JobPosting) → MatchComponents`; everything here is
//! deterministic given the semantic scorer's output.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::corpus::JobPosting;
use crate::matching::normalizer::ParsedResume;
use crate::matching::semantic::SemanticScorer;
use crate::matching::skills::normalize_skill_set;

/// Fixed component weights. Must sum to 1.0 (checked by test).
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub skill: f64,
    pub semantic: f64,
    pub title: f64,
}

pub const MATCH_WEIGHTS: Weights = Weights {
    skill: 0.40,
    semantic: 0.35,
    title: 0.25,
};

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skill + self.semantic + self.title
    }
}

/// Results below this combined score are dropped from the ranked output
/// entirely. A hard filter, not a display threshold.
pub const MIN_MATCH_SCORE: u8 = 60;

/// Only results at or above this combined score get an LLM explanation.
pub const EXPLANATION_THRESHOLD: u8 = 80;

/// Weight multiplier per step away from the most recent title.
const TITLE_RECENCY_DECAY: f64 = 0.85;

/// The three independent sub-scores for one (resume, posting) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchComponents {
    pub skill_score: u8,
    pub semantic_score: u8,
    pub title_score: u8,
    pub matched_skills: BTreeSet<String>,
    pub missed_skills: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    Strong,
    Good,
    Low,
}

impl MatchLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            MatchLevel::Strong
        } else if score >= MIN_MATCH_SCORE {
            MatchLevel::Good
        } else {
            MatchLevel::Low
        }
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLevel::Strong => write!(f, "Strong"),
            MatchLevel::Good => write!(f, "Good"),
            MatchLevel::Low => write!(f, "Low"),
        }
    }
}

/// A job posting enriched with its match scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub title: String,
    pub category: String,
    pub components: MatchComponents,
    pub match_score: u8,
    pub match_level: MatchLevel,
    /// Present only for qualifying matches whose explanation succeeded.
    pub match_explanation: Option<String>,
}

/// Scores one posting against the parsed resume.
///
/// A malformed posting (blank id, or no title and no description) is an
/// error here; the pipeline skips and counts it rather than failing the run.
pub async fn score_posting(
    resume: &ParsedResume,
    posting: &JobPosting,
    semantic: &dyn SemanticScorer,
) -> Result<MatchResult> {
    if posting.id.trim().is_empty() {
        anyhow::bail!("posting has a blank id");
    }
    if posting.title.trim().is_empty() && posting.description.trim().is_empty() {
        anyhow::bail!("posting {} has no title or description", posting.id);
    }

    let (skill_score, matched_skills, missed_skills) = score_skills(resume, posting);
    let semantic_score = semantic
        .similarity(&resume.full_text, &posting.description)
        .await?;
    let title_score = score_title(&resume.titles, &posting.title);

    let match_score = combine_score(skill_score, semantic_score, title_score);

    Ok(MatchResult {
        id: posting.id.clone(),
        title: posting.title.clone(),
        category: posting.category.clone(),
        components: MatchComponents {
            skill_score,
            semantic_score,
            title_score,
            matched_skills,
            missed_skills,
        },
        match_score,
        match_level: MatchLevel::from_score(match_score),
        match_explanation: None,
    })
}

/// Proportion of required skills present in the resume, on `[0, 100]`.
/// A posting with no requirements is vacuously satisfied.
fn score_skills(
    resume: &ParsedResume,
    posting: &JobPosting,
) -> (u8, BTreeSet<String>, BTreeSet<String>) {
    let required = normalize_skill_set(&posting.required_skills);
    if required.is_empty() {
        return (100, BTreeSet::new(), BTreeSet::new());
    }

    let matched: BTreeSet<String> = required.intersection(&resume.skills).cloned().collect();
    let missed: BTreeSet<String> = required.difference(&resume.skills).cloned().collect();
    let score = ((matched.len() as f64 / required.len() as f64) * 100.0).round() as u8;

    (score, matched, missed)
}

/// Recency-weighted best title similarity, on `[0, 100]`.
///
/// Each step away from the most recent title decays the weight, so an old
/// matching title counts for less than a current one.
fn score_title(titles: &[String], job_title: &str) -> u8 {
    let job_title = job_title.to_lowercase();
    let mut best = 0.0f64;

    for (i, title) in titles.iter().enumerate() {
        let weight = TITLE_RECENCY_DECAY.powi(i as i32);
        let similarity = strsim::jaro_winkler(&title.to_lowercase(), &job_title);
        best = best.max(similarity * weight);
    }

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

/// `round(0.40·skill + 0.35·semantic + 0.25·title)`.
pub fn combine_score(skill: u8, semantic: u8, title: u8) -> u8 {
    let combined = MATCH_WEIGHTS.skill * f64::from(skill)
        + MATCH_WEIGHTS.semantic * f64::from(semantic)
        + MATCH_WEIGHTS.title * f64::from(title);
    combined.round().clamp(0.0, 100.0) as u8
}

/// Applies the hard score filter and the deterministic ordering:
/// score desc, then skill score desc, then posting id asc.
pub fn rank_and_filter(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.retain(|r| r.match_score >= MIN_MATCH_SCORE);
    results.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then(b.components.skill_score.cmp(&a.components.skill_score))
            .then(a.id.cmp(&b.id))
    });
    results
}
