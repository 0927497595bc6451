//! Explanation Generator — pluggable, trait-based rationale generation for
//! qualifying matches only.
//!
//! Invoked after ranking, and only for results at or above
//! `EXPLANATION_THRESHOLD`; this bounds external-dependency cost. Failure
//! degrades gracefully: the result keeps `match_explanation = None` and the
//! task never fails because of it.

use async_trait::async_trait;

use crate::llm_client::LlmClient;
use crate::matching::normalizer::ParsedResume;
use crate::matching::prompts::{EXPLAIN_PROMPT_TEMPLATE, EXPLAIN_SYSTEM};
use crate::matching::scoring::MatchResult;

/// Resume text beyond this many characters is elided from the prompt.
const MAX_RESUME_EXCERPT_CHARS: usize = 4000;

/// Generates a short natural-language rationale for one qualifying match.
///
/// Carried in the worker context as `Arc<dyn ExplanationProvider>`.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(&self, resume: &ParsedResume, result: &MatchResult)
        -> anyhow::Result<String>;
}

/// LLM-backed explanation provider.
pub struct LlmExplainer {
    llm: LlmClient,
}

impl LlmExplainer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ExplanationProvider for LlmExplainer {
    async fn explain(
        &self,
        resume: &ParsedResume,
        result: &MatchResult,
    ) -> anyhow::Result<String> {
        let prompt = build_explain_prompt(resume, result);
        let text = self.llm.call_text(&prompt, EXPLAIN_SYSTEM).await?;
        if text.is_empty() {
            anyhow::bail!("explanation came back empty");
        }
        Ok(text)
    }
}

fn build_explain_prompt(resume: &ParsedResume, result: &MatchResult) -> String {
    let excerpt: String = resume
        .full_text
        .chars()
        .take(MAX_RESUME_EXCERPT_CHARS)
        .collect();

    EXPLAIN_PROMPT_TEMPLATE
        .replace("{job_title}", &result.title)
        .replace("{match_score}", &result.match_score.to_string())
        .replace("{matched_skills}", &join_or_none(&result.components.matched_skills))
        .replace("{missed_skills}", &join_or_none(&result.components.missed_skills))
        .replace("{resume_excerpt}", &excerpt)
}

fn join_or_none(skills: &std::collections::BTreeSet<String>) -> String {
    if skills.is_empty() {
        "none".to_string()
    } else {
        skills.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
