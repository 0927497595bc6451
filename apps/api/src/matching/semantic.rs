//! Semantic similarity — pluggable, trait-based scorer comparing resume
//! text against a posting description.
//!
//! Default: `HashEmbeddingScorer` (pure-Rust, fast, deterministic, fully
//! testable). Swap the trait object in `AppState` to plug in an external
//! embedding model without touching the pipeline.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use crate::errors::MatchError;

/// Fixed seeds keep the hash deterministic across builds and platforms.
const HASH_SEED_K0: u64 = 0x7f4a_9c31_d2e8_0b65;
const HASH_SEED_K1: u64 = 0x1b86_e5f0_4a3d_c972;

const EMBEDDING_DIM: usize = 256;

/// Scores how semantically close two texts are, on `[0, 100]`.
///
/// Implementations must be bounded and symmetric-enough; determinism is
/// expected for a byte-identical input pair.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    async fn similarity(&self, resume_text: &str, description: &str) -> Result<u8, MatchError>;
}

/// Feature-hashing bag-of-tokens embedding compared by cosine similarity.
///
/// No model weights, no network: tokens are sign-hashed into a fixed-size
/// vector with SipHash-1-3 under fixed seeds, L2-normalized, and the cosine
/// is mapped onto `[0, 100]`.
pub struct HashEmbeddingScorer;

#[async_trait]
impl SemanticScorer for HashEmbeddingScorer {
    async fn similarity(&self, resume_text: &str, description: &str) -> Result<u8, MatchError> {
        let a = embed(resume_text);
        let b = embed(description);
        let cosine = cosine_similarity(&a, &b);
        // cosine ∈ [-1, 1] → [0, 100]
        Ok((((cosine + 1.0) / 2.0) * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}

fn hash_token(token: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
    token.hash(&mut hasher);
    hasher.finish()
}

fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIM];

    for token in tokenize(text) {
        let h = hash_token(token);
        let idx = (h as usize) % EMBEDDING_DIM;
        // Sign hashing: a second hash bit decides +1/-1 so collisions
        // cancel instead of piling up.
        let sign = if hash_token(token) >> 63 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign;
    }

    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
