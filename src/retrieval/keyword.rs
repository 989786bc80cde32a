//! Keyword-based relevance scoring
//!
//! Two policies over the same knowledge base: substring scoring against
//! intents (quadratic phrase-length weighting with context priority) and
//! plain word-set intersection against facts.

use std::collections::HashSet;

use crate::models::Fact;
use crate::models::Intent;
use crate::text::normalize;
use crate::text::word_count;

/// Context-priority multiplier for intents gated on the caller's context
pub const CONTEXT_PRIORITY: f32 = 1.5;

/// An intent selected by keyword scoring
#[derive(Debug, Clone)]
pub struct IntentMatch<'a> {
    pub intent: &'a Intent,
    pub score: f32,
}

/// A fact selected by overlap or similarity scoring
#[derive(Debug, Clone)]
pub struct FactMatch<'a> {
    pub fact: &'a Fact,
    pub index: usize,
    pub score: f32,
}

/// Substring keyword scoring over intents.
///
/// Each keyword that appears (normalized) as a substring of the normalized
/// question contributes `word_count^2`. The sum is multiplied by 1.5 when the
/// intent's `context_filter` equals the caller's current context; intents
/// whose filter is set but differs are skipped entirely. Strictly-highest
/// score wins, first seen kept on ties. All-zero means no match.
pub fn best_intent<'a>(
    intents: &'a [Intent],
    normalized_question: &str,
    current_context: Option<&str>,
) -> Option<IntentMatch<'a>> {
    let mut best: Option<IntentMatch<'a>> = None;

    for intent in intents {
        let priority = match intent.context_filter.as_deref() {
            Some(filter) => {
                if current_context != Some(filter) {
                    continue;
                }
                CONTEXT_PRIORITY
            }
            None => 1.0,
        };

        let mut score = 0.0_f32;
        for keyword in &intent.keywords {
            let normalized_keyword = normalize(keyword);
            if !normalized_keyword.is_empty() && normalized_question.contains(&normalized_keyword) {
                let words = word_count(&normalized_keyword);
                score += (words * words) as f32;
            }
        }

        let final_score = score * priority;
        if final_score > best.as_ref().map_or(0.0, |b| b.score) {
            best = Some(IntentMatch {
                intent,
                score: final_score,
            });
        }
    }

    best
}

/// Word-set intersection over facts.
///
/// Score is the count of normalized question words that are members of the
/// fact's normalized keyword set. Highest count wins, first seen kept on
/// ties; zero means no match.
pub fn best_fact_by_overlap<'a>(
    facts: &'a [Fact],
    normalized_question: &str,
) -> Option<FactMatch<'a>> {
    let question_words: Vec<&str> = normalized_question.split_whitespace().collect();
    if question_words.is_empty() {
        return None;
    }

    let mut best: Option<FactMatch<'a>> = None;

    for (index, fact) in facts.iter().enumerate() {
        let keyword_words: HashSet<String> = fact
            .search_keywords
            .iter()
            .flat_map(|k| {
                normalize(k)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        let overlap = question_words
            .iter()
            .filter(|w| keyword_words.contains(**w))
            .count();

        if overlap as f32 > best.as_ref().map_or(0.0, |b| b.score) {
            best = Some(FactMatch {
                fact,
                index,
                score: overlap as f32,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(tag: &str, keywords: &[&str]) -> Intent {
        Intent {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            answer: String::new(),
            context_filter: None,
            context_set: None,
            entity: None,
            follow_up: None,
        }
    }

    fn fact(keywords: &[&str]) -> Fact {
        Fact {
            topic: "t".to_string(),
            information: "i".to_string(),
            search_keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            embedding: None,
        }
    }

    #[test]
    fn test_no_overlap_is_no_match() {
        let intents = vec![intent("ferias", &["férias"])];
        assert!(best_intent(&intents, "qual o horario do almoco", None).is_none());

        let facts = vec![fact(&["férias"])];
        assert!(best_fact_by_overlap(&facts, "horario do almoco").is_none());
    }

    #[test]
    fn test_two_word_phrase_scores_four() {
        let intents = vec![intent("vr", &["vale refeição"])];
        let m = best_intent(&intents, &normalize("Qual o valor do vale refeição?"), None).unwrap();
        assert_eq!(m.intent.tag, "vr");
        assert!((m.score - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_longer_phrase_beats_contained_shorter() {
        // "vale refeição" (4 points) must beat "vale" (1 point)
        let intents = vec![intent("curto", &["vale"]), intent("longo", &["vale refeição"])];
        let m = best_intent(&intents, "qual o valor do vale refeicao", None).unwrap();
        assert_eq!(m.intent.tag, "longo");
    }

    #[test]
    fn test_context_filter_excludes_on_mismatch() {
        let mut gated = intent("gated", &["valor"]);
        gated.context_filter = Some("beneficios".to_string());
        let intents = vec![gated];

        assert!(best_intent(&intents, "qual o valor", Some("ferias")).is_none());
        assert!(best_intent(&intents, "qual o valor", None).is_none());
    }

    #[test]
    fn test_context_match_gets_priority() {
        let mut gated = intent("gated", &["valor"]);
        gated.context_filter = Some("beneficios".to_string());
        let open = intent("open", &["valor"]);
        let intents = vec![open, gated];

        let m = best_intent(&intents, "qual o valor", Some("beneficios")).unwrap();
        assert_eq!(m.intent.tag, "gated");
        assert!((m.score - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let intents = vec![intent("a", &["valor"]), intent("b", &["valor"])];
        let m = best_intent(&intents, "qual o valor", None).unwrap();
        assert_eq!(m.intent.tag, "a");
    }

    #[test]
    fn test_overlap_counts_shared_words() {
        let facts = vec![fact(&["vale refeição"]), fact(&["plano", "saúde"])];
        let m = best_fact_by_overlap(&facts, &normalize("como funciona o plano de saúde")).unwrap();
        assert_eq!(m.index, 1);
        assert!((m.score - 2.0).abs() < f32::EPSILON);
    }
}
