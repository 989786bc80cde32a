//! Embedding-similarity fact selection
//!
//! Scores are raw dot products between the query vector and each fact's
//! precomputed vector. The embedding provider is assumed to return
//! near-unit-norm vectors, so this behaves like cosine similarity without an
//! explicit normalization step; see DESIGN.md before changing that.

use tracing::debug;

use super::keyword::FactMatch;
use crate::models::Fact;

/// Dot product over the shared prefix of two vectors.
/// Mismatched lengths indicate a stale precomputed file; the shorter length
/// bounds the sum rather than panicking mid-request.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Best fact by dot-product similarity, accepted only strictly above the
/// confidence threshold. Facts without a precomputed embedding are skipped.
pub fn best_fact_by_embedding<'a>(
    facts: &'a [Fact],
    query_embedding: &[f32],
    confidence_threshold: f32,
) -> Option<FactMatch<'a>> {
    let mut best: Option<FactMatch<'a>> = None;

    for (index, fact) in facts.iter().enumerate() {
        let Some(embedding) = &fact.embedding else {
            continue;
        };
        let score = dot(query_embedding, embedding);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(FactMatch { fact, index, score });
        }
    }

    match best {
        Some(m) if m.score > confidence_threshold => {
            debug!(
                "Embedding match: fact #{} ({}) score {:.4}",
                m.index, m.fact.topic, m.score
            );
            Some(m)
        }
        Some(m) => {
            debug!(
                "Best embedding score {:.4} not above threshold {:.2}, no match",
                m.score, confidence_threshold
            );
            None
        }
        None => None,
    }
}
