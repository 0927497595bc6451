//! Match pipeline — the full run a worker executes for one task:
//! normalize → score every posting → rank and filter → explain the
//! strongest matches.
//!
//! Per-posting scoring failures and per-match explanation failures are
//! absorbed (logged, counted); the run only fails when the resume is
//! unreadable or every posting failed to score.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::corpus::JobCorpus;
use crate::errors::MatchError;
use crate::matching::explain::ExplanationProvider;
use crate::matching::normalizer::{parse_resume, ResumeInput};
use crate::matching::scoring::{rank_and_filter, score_posting, MatchResult, EXPLANATION_THRESHOLD};
use crate::matching::semantic::SemanticScorer;

/// Progress checkpoints: normalization accounts for the first 10%, scoring
/// interpolates up to 90%, explanations close out the rest.
const PROGRESS_PARSED: u8 = 10;
const PROGRESS_SCORED: u8 = 90;

/// Shared read-only collaborators a worker scores with.
pub struct MatchContext {
    pub corpus: Arc<dyn JobCorpus>,
    pub semantic: Arc<dyn SemanticScorer>,
    pub explainer: Arc<dyn ExplanationProvider>,
}

/// Runs one full match. `report_progress` receives monotonically increasing
/// values in `[0, 100]`.
pub async fn run_match(
    input: &ResumeInput,
    ctx: &MatchContext,
    report_progress: impl Fn(u8),
) -> Result<Vec<MatchResult>> {
    let resume = parse_resume(input)?;
    report_progress(PROGRESS_PARSED);
    info!(
        skills = resume.skills.len(),
        titles = resume.titles.len(),
        "Resume normalized"
    );

    let postings = ctx.corpus.postings().await?;
    let total = postings.len();

    let mut scored = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for (done, posting) in postings.iter().enumerate() {
        match score_posting(&resume, posting, ctx.semantic.as_ref()).await {
            Ok(result) => scored.push(result),
            Err(e) => {
                skipped += 1;
                warn!("Skipping posting {}: {e}", posting.id);
            }
        }

        let progress = PROGRESS_PARSED
            + (((done + 1) as f64 / total.max(1) as f64)
                * f64::from(PROGRESS_SCORED - PROGRESS_PARSED)) as u8;
        report_progress(progress);
    }

    if scored.is_empty() && skipped > 0 {
        return Err(MatchError::ScoringExhausted { failed: skipped }.into());
    }

    let mut ranked = rank_and_filter(scored);
    info!(
        total,
        skipped,
        returned = ranked.len(),
        "Scoring complete"
    );

    for result in ranked.iter_mut() {
        if result.match_score < EXPLANATION_THRESHOLD {
            continue;
        }
        match ctx.explainer.explain(&resume, result).await {
            Ok(text) => result.match_explanation = Some(text),
            Err(e) => {
                // Degrade gracefully: the match is returned unexplained.
                warn!("Explanation failed for posting {}: {e}", result.id);
            }
        }
    }
    report_progress(100);

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{InMemoryCorpus, JobPosting};
    use crate::matching::normalizer::ParsedResume;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedSemantic(u8);

    #[async_trait::async_trait]
    impl SemanticScorer for FixedSemantic {
        async fn similarity(&self, _resume: &str, _description: &str) -> Result<u8, MatchError> {
            Ok(self.0)
        }
    }

    struct CountingExplainer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingExplainer {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait::async_trait]
    impl ExplanationProvider for CountingExplainer {
        async fn explain(
            &self,
            _resume: &ParsedResume,
            result: &MatchResult,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("generator unavailable");
            }
            Ok(format!("Strong overlap with {}", result.title))
        }
    }

    fn posting(id: &str, required: &[&str]) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: "Backend Engineer".to_string(),
            description: "Backend services".to_string(),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            category: "engineering".to_string(),
        }
    }

    fn malformed_posting() -> JobPosting {
        JobPosting {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            required_skills: vec![],
            category: String::new(),
        }
    }

    fn ctx(postings: Vec<JobPosting>, semantic: u8, fail_explain: bool) -> MatchContext {
        MatchContext {
            corpus: Arc::new(InMemoryCorpus::new(postings)),
            semantic: Arc::new(FixedSemantic(semantic)),
            explainer: Arc::new(CountingExplainer::new(fail_explain)),
        }
    }

    fn resume_input() -> ResumeInput {
        ResumeInput::Text(
            "Backend Engineer\nPython and SQL services with Docker deployments".to_string(),
        )
    }

    #[tokio::test]
    async fn test_one_malformed_posting_does_not_fail_the_run() {
        let mut postings: Vec<JobPosting> =
            (1..=9).map(|i| posting(&format!("j{i}"), &[])).collect();
        postings.insert(4, malformed_posting());

        let ctx = ctx(postings, 100, false);
        let results = run_match(&resume_input(), &ctx, |_| {}).await.unwrap();

        // 10 postings, 1 malformed → 9 scored, all above the filter here
        assert_eq!(results.len(), 9);
    }

    #[tokio::test]
    async fn test_all_postings_failing_is_scoring_exhausted() {
        let ctx = ctx(vec![malformed_posting(), malformed_posting()], 100, false);
        let err = run_match(&resume_input(), &ctx, |_| {}).await.unwrap_err();

        match err.downcast_ref::<MatchError>() {
            Some(MatchError::ScoringExhausted { failed }) => assert_eq!(*failed, 2),
            other => panic!("expected ScoringExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_corpus_completes_with_no_results() {
        let ctx = ctx(vec![], 100, false);
        let results = run_match(&resume_input(), &ctx, |_| {}).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_resume_fails_with_parse_failure() {
        let ctx = ctx(vec![posting("j1", &[])], 100, false);
        let input = ResumeInput::File {
            bytes: bytes::Bytes::from_static(&[0xff, 0xfe]),
            mime: crate::matching::normalizer::MIME_TXT.to_string(),
        };
        let err = run_match(&input, &ctx, |_| {}).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchError>(),
            Some(MatchError::ParseFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_only_qualifying_matches_are_explained() {
        // j_strong: vacuous skill 100, semantic 100 → well above 80.
        // j_good: 2 of 3 required skills → skill 67, semantic 60,
        //         title 0-ish → lands in [60, 80).
        let postings = vec![
            posting("j_strong", &[]),
            {
                let mut p = posting("j_good", &["python", "sql", "kubernetes"]);
                p.title = "Unrelated Role Name".to_string();
                p
            },
        ];
        let explainer = Arc::new(CountingExplainer::new(false));
        let ctx = MatchContext {
            corpus: Arc::new(InMemoryCorpus::new(postings)),
            semantic: Arc::new(FixedSemantic(60)),
            explainer: explainer.clone(),
        };

        let results = run_match(&resume_input(), &ctx, |_| {}).await.unwrap();

        let strong = results.iter().find(|r| r.id == "j_strong").unwrap();
        let good = results.iter().find(|r| r.id == "j_good").unwrap();

        assert!(strong.match_score >= EXPLANATION_THRESHOLD);
        assert!(strong.match_explanation.is_some());
        assert!(good.match_score < EXPLANATION_THRESHOLD);
        assert!(good.match_explanation.is_none());
        assert_eq!(explainer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explanation_failure_keeps_the_result() {
        let ctx = ctx(vec![posting("j1", &[])], 100, true);
        let results = run_match(&resume_input(), &ctx, |_| {}).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].match_score >= EXPLANATION_THRESHOLD);
        assert!(results[0].match_explanation.is_none());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_reaches_100() {
        let seen = Mutex::new(Vec::new());
        let ctx = ctx(
            (1..=5).map(|i| posting(&format!("j{i}"), &[])).collect(),
            100,
            false,
        );

        run_match(&resume_input(), &ctx, |p| seen.lock().unwrap().push(p))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress decreased: {seen:?}");
        assert_eq!(*seen.first().unwrap(), 10);
        assert_eq!(*seen.last().unwrap(), 100);
    }
}
