//! Relevance selection over the knowledge base
//!
//! One canonical selector with three interchangeable strategies: substring
//! keyword scoring against intents, word-set intersection against facts, and
//! embedding similarity against precomputed fact vectors. Pure per request;
//! the embedding strategy is the only one touching the network, and a failed
//! embedding call degrades to "no match" instead of surfacing an error.

pub mod keyword;
pub mod semantic;

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

pub use keyword::best_fact_by_overlap;
pub use keyword::best_intent;
pub use keyword::FactMatch;
pub use keyword::IntentMatch;
pub use keyword::CONTEXT_PRIORITY;
pub use semantic::best_fact_by_embedding;
pub use semantic::dot;

use crate::embeddings::EmbeddingService;
use crate::knowledge::KnowledgeBase;
use crate::CelineError;

/// Which relevance policy to run for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Keyword substring scoring against intents
    Substring,
    /// Word-set intersection against facts
    SetIntersection,
    /// Dot-product similarity against precomputed fact embeddings
    Embedding,
}

impl FromStr for SelectionStrategy {
    type Err = CelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substring" => Ok(Self::Substring),
            "set" => Ok(Self::SetIntersection),
            "embedding" => Ok(Self::Embedding),
            other => Err(CelineError::Config(format!(
                "Unknown retrieval strategy '{other}' (expected substring, set or embedding)"
            ))),
        }
    }
}

/// Outcome of a selection run
#[derive(Debug)]
pub enum Selection<'a> {
    /// An intent matched; the answer template comes from it directly
    Intent(IntentMatch<'a>),
    /// A fact matched; its information is context for the composer
    Fact(FactMatch<'a>),
    /// Nothing scored above zero / above the confidence threshold
    NoMatch,
}

impl Selection<'_> {
    pub fn is_no_match(&self) -> bool {
        matches!(self, Selection::NoMatch)
    }
}

/// Selector over the process-wide immutable knowledge base
pub struct Selector {
    knowledge: Arc<KnowledgeBase>,
    embeddings: Option<Arc<EmbeddingService>>,
    confidence_threshold: f32,
}

impl Selector {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        embeddings: Option<Arc<EmbeddingService>>,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            knowledge,
            embeddings,
            confidence_threshold,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Pick at most one intent or fact for a normalized question.
    ///
    /// The embedding strategy calls the external embedding service; a failure
    /// there is logged and mapped to `NoMatch`, never raised to the caller.
    pub async fn select(
        &self,
        normalized_question: &str,
        current_context: Option<&str>,
        strategy: SelectionStrategy,
    ) -> Selection<'_> {
        match strategy {
            SelectionStrategy::Substring => {
                match best_intent(&self.knowledge.intents, normalized_question, current_context) {
                    Some(m) => Selection::Intent(m),
                    None => Selection::NoMatch,
                }
            }
            SelectionStrategy::SetIntersection => {
                match best_fact_by_overlap(&self.knowledge.facts, normalized_question) {
                    Some(m) => Selection::Fact(m),
                    None => Selection::NoMatch,
                }
            }
            SelectionStrategy::Embedding => {
                let Some(service) = &self.embeddings else {
                    warn!("Embedding strategy selected but no embedding service configured");
                    return Selection::NoMatch;
                };
                let query_embedding = match service.generate(normalized_question).await {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        warn!("Embedding generation failed, returning no match: {e}");
                        return Selection::NoMatch;
                    }
                };
                match best_fact_by_embedding(
                    &self.knowledge.facts,
                    &query_embedding,
                    self.confidence_threshold,
                ) {
                    Some(m) => Selection::Fact(m),
                    None => Selection::NoMatch,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "substring".parse::<SelectionStrategy>().unwrap(),
            SelectionStrategy::Substring
        );
        assert_eq!(
            "set".parse::<SelectionStrategy>().unwrap(),
            SelectionStrategy::SetIntersection
        );
        assert_eq!(
            "embedding".parse::<SelectionStrategy>().unwrap(),
            SelectionStrategy::Embedding
        );
        assert!("fuzzy".parse::<SelectionStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_embedding_strategy_without_service_is_no_match() {
        let selector = Selector::new(Arc::new(KnowledgeBase::default()), None, 0.65);
        let selection = selector.select("pergunta", None, SelectionStrategy::Embedding).await;
        assert!(selection.is_no_match());
    }
}
