//! Offline embedding precompute for the knowledge base
//!
//! Reads the knowledge file, embeds each fact's topic+information text and
//! writes a copy with the vectors filled in. A per-fact failure is logged
//! and leaves that fact without an embedding; the run continues.

use std::path::Path;

use tracing::error;
use tracing::info;

use super::EmbeddingService;
use crate::knowledge::KnowledgeBase;
use crate::Result;

/// Text embedded for a fact: the same shape the retrieval side will be
/// compared against
pub fn fact_embedding_text(topic: &str, information: &str) -> String {
    format!("Tópico: {topic}\nInformação: {information}")
}

/// Embed every fact in `input` and write the result to `output`
pub async fn precompute_embeddings<P: AsRef<Path>>(
    service: &EmbeddingService,
    input: P,
    output: P,
) -> Result<()> {
    let mut kb = KnowledgeBase::from_file(&input)?;
    info!(
        "Generating embeddings for {} facts from {}",
        kb.facts.len(),
        input.as_ref().display()
    );

    let mut generated = 0usize;
    let mut failed = 0usize;

    for fact in &mut kb.facts {
        let text = fact_embedding_text(&fact.topic, &fact.information);
        info!("Generating embedding for topic: {}", fact.topic);
        match service.generate(&text).await {
            Ok(embedding) => {
                fact.embedding = Some(embedding);
                generated += 1;
            }
            Err(e) => {
                // Skip this fact but keep going with the others
                error!("Failed to embed '{}': {e}", fact.topic);
                fact.embedding = None;
                failed += 1;
            }
        }
    }

    let json = serde_json::to_string_pretty(&kb)?;
    std::fs::write(&output, json)?;

    info!(
        "Wrote {} ({} embedded, {} failed)",
        output.as_ref().display(),
        generated,
        failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_embedding_text_shape() {
        let text = fact_embedding_text("Benefícios", "R$35/dia");
        assert_eq!(text, "Tópico: Benefícios\nInformação: R$35/dia");
    }
}
