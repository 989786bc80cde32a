//! Answer pipeline: Normalize -> Select -> Compose
//!
//! Ties the normalizer, synonym expansion, relevance selector and the LLM
//! composer together for one request. The pipeline never fails a request on
//! a downstream error; it degrades to the fixed fallback answer instead.

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::knowledge::load_synonyms;
use crate::knowledge::KnowledgeBase;
use crate::llm::AssistantPrompts;
use crate::llm::LlmService;
use crate::llm::StreamingResponse;
use crate::models::ChatTurn;
use crate::retrieval::Selection;
use crate::retrieval::SelectionStrategy;
use crate::retrieval::Selector;
use crate::text::normalize;
use crate::text::SynonymExpander;
use crate::Result;

/// Fixed answer when nothing matched and the composer is skipped
pub const FALLBACK_ANSWER: &str =
    "Desculpe, não entendi sua pergunta. Pode tentar reformular?";

/// Composed reply for one question
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub answer: String,
    /// Context tag the caller should carry into the next turn
    pub context: Option<String>,
    pub follow_up: Option<String>,
}

/// Reply for the streaming endpoint
pub enum AnswerStream {
    /// Direct or fallback answers have no incremental source
    Immediate(String),
    /// LLM fragments forwarded in arrival order
    Streaming(StreamingResponse),
}

/// What to do once selection has run
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerPlan {
    /// Answer assembled from an intent template, composer not involved
    Direct {
        answer: String,
        context: Option<String>,
        follow_up: Option<String>,
    },
    /// Hand the instruction plus history to the composer
    Compose { system_instruction: String },
    /// Fixed fallback, composer skipped
    Fallback,
}

/// Decide the plan for a selection outcome.
///
/// With no selected fact and an empty history the composer is never invoked;
/// the fixed fallback short-circuits the request.
pub fn plan_from_selection(
    selection: &Selection<'_>,
    knowledge: &KnowledgeBase,
    normalized_question: &str,
    history_is_empty: bool,
    composer_available: bool,
) -> AnswerPlan {
    match selection {
        Selection::Intent(m) => {
            let intent = m.intent;
            let mut answer = intent.answer.clone();

            if let Some(entity_type) = &intent.entity {
                match knowledge.extract_entity(normalized_question, entity_type) {
                    Some((name, value)) => {
                        answer = answer
                            .replace(&format!("{{{entity_type}}}"), &name)
                            .replace("{chefe}", &value);
                    }
                    None => {
                        answer = format!(
                            "Não consegui identificar sobre qual {entity_type} você está perguntando. Pode especificar?"
                        );
                    }
                }
            }

            AnswerPlan::Direct {
                answer,
                context: intent.context_set.clone(),
                follow_up: intent.follow_up.clone(),
            }
        }
        Selection::Fact(m) => {
            if composer_available {
                AnswerPlan::Compose {
                    system_instruction: AssistantPrompts::render_with_fact(
                        &m.fact.topic,
                        &m.fact.information,
                    ),
                }
            } else {
                AnswerPlan::Direct {
                    answer: m.fact.information.clone(),
                    context: None,
                    follow_up: None,
                }
            }
        }
        Selection::NoMatch => {
            if history_is_empty || !composer_available {
                AnswerPlan::Fallback
            } else {
                AnswerPlan::Compose {
                    system_instruction: AssistantPrompts::without_fact()
                        .render(&std::collections::HashMap::new()),
                }
            }
        }
    }
}

/// Conversation turns handed to the composer: caller history plus the
/// current question as the final user turn
fn build_contents(history: &[ChatTurn], question: &str) -> Vec<ChatTurn> {
    let mut contents = history.to_vec();
    contents.push(ChatTurn::user(question));
    contents
}

/// Complete assistant service
pub struct Assistant {
    selector: Selector,
    expander: SynonymExpander,
    llm: Option<LlmService>,
    strategy: SelectionStrategy,
}

impl Assistant {
    /// Build the assistant from the application config, loading the
    /// knowledge base and synonym map once
    ///
    /// # Errors
    /// - Invalid retrieval strategy or synonym pattern
    /// - Embedding/LLM service configuration errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let knowledge = Arc::new(KnowledgeBase::load_or_empty(config.knowledge_path()));

        let synonyms = config
            .synonyms_path()
            .map(load_synonyms)
            .unwrap_or_default();
        let expander = SynonymExpander::new(&synonyms)?;

        let strategy: SelectionStrategy = config.retrieval.strategy.parse()?;

        let embeddings = if strategy == SelectionStrategy::Embedding {
            Some(Arc::new(EmbeddingService::new(config)?))
        } else {
            None
        };

        let llm = if config.llm.enabled {
            Some(LlmService::new(config)?)
        } else {
            None
        };

        let selector = Selector::new(knowledge, embeddings, config.confidence_threshold());

        Ok(Self {
            selector,
            expander,
            llm,
            strategy,
        })
    }

    /// Build from preconstructed parts
    pub fn from_parts(
        selector: Selector,
        expander: SynonymExpander,
        llm: Option<LlmService>,
        strategy: SelectionStrategy,
    ) -> Self {
        Self {
            selector,
            expander,
            llm,
            strategy,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.selector.knowledge()
    }

    /// Answer one question
    pub async fn answer(
        &self,
        question: &str,
        current_context: Option<&str>,
        history: &[ChatTurn],
    ) -> AssistantReply {
        let normalized = self.expander.expand(&normalize(question));
        debug!("Normalized question: {normalized}");

        let selection = self
            .selector
            .select(&normalized, current_context, self.strategy)
            .await;

        let plan = plan_from_selection(
            &selection,
            self.selector.knowledge(),
            &normalized,
            history.is_empty(),
            self.llm.is_some(),
        );

        match plan {
            AnswerPlan::Direct {
                answer,
                context,
                follow_up,
            } => AssistantReply {
                answer,
                context,
                follow_up,
            },
            AnswerPlan::Fallback => AssistantReply {
                answer: FALLBACK_ANSWER.to_string(),
                context: None,
                follow_up: None,
            },
            AnswerPlan::Compose { system_instruction } => {
                // llm is present whenever the plan asks for composition
                let Some(llm) = &self.llm else {
                    return AssistantReply {
                        answer: FALLBACK_ANSWER.to_string(),
                        context: None,
                        follow_up: None,
                    };
                };
                let contents = build_contents(history, question);
                match llm.generate(&system_instruction, &contents).await {
                    Ok(answer) => {
                        info!("Composer produced {} chars", answer.len());
                        AssistantReply {
                            answer,
                            context: None,
                            follow_up: None,
                        }
                    }
                    Err(e) => {
                        // Degraded answer, never an HTTP error
                        error!("Composer failed: {e}");
                        AssistantReply {
                            answer: FALLBACK_ANSWER.to_string(),
                            context: None,
                            follow_up: None,
                        }
                    }
                }
            }
        }
    }

    /// Answer one question as a fragment stream
    pub async fn answer_stream(
        &self,
        question: &str,
        current_context: Option<&str>,
        history: &[ChatTurn],
    ) -> AnswerStream {
        let normalized = self.expander.expand(&normalize(question));

        let selection = self
            .selector
            .select(&normalized, current_context, self.strategy)
            .await;

        let plan = plan_from_selection(
            &selection,
            self.selector.knowledge(),
            &normalized,
            history.is_empty(),
            self.llm.is_some(),
        );

        match plan {
            AnswerPlan::Direct { answer, .. } => AnswerStream::Immediate(answer),
            AnswerPlan::Fallback => AnswerStream::Immediate(FALLBACK_ANSWER.to_string()),
            AnswerPlan::Compose { system_instruction } => {
                let Some(llm) = &self.llm else {
                    return AnswerStream::Immediate(FALLBACK_ANSWER.to_string());
                };
                let contents = build_contents(history, question);
                match llm.generate_stream(&system_instruction, &contents).await {
                    Ok(stream) => AnswerStream::Streaming(stream),
                    Err(e) => {
                        error!("Composer stream failed: {e}");
                        AnswerStream::Immediate(FALLBACK_ANSWER.to_string())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intent;
    use crate::retrieval::IntentMatch;

    fn kb_with_entities() -> KnowledgeBase {
        let json = r#"{
            "entities": {
                "setor": {"financeiro": "Paulo Mendes"}
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    fn intent_with_entity() -> Intent {
        Intent {
            tag: "chefe_setor".to_string(),
            keywords: vec!["chefe".to_string()],
            answer: "O chefe do setor {setor} é {chefe}.".to_string(),
            context_filter: None,
            context_set: Some("chefias".to_string()),
            entity: Some("setor".to_string()),
            follow_up: None,
        }
    }

    #[test]
    fn test_no_match_empty_history_short_circuits() {
        let plan = plan_from_selection(
            &Selection::NoMatch,
            &KnowledgeBase::default(),
            "pergunta",
            true,
            true,
        );
        assert_eq!(plan, AnswerPlan::Fallback);
    }

    #[test]
    fn test_no_match_with_history_composes() {
        let plan = plan_from_selection(
            &Selection::NoMatch,
            &KnowledgeBase::default(),
            "pergunta",
            false,
            true,
        );
        assert!(matches!(plan, AnswerPlan::Compose { .. }));
    }

    #[test]
    fn test_no_match_without_composer_falls_back() {
        let plan = plan_from_selection(
            &Selection::NoMatch,
            &KnowledgeBase::default(),
            "pergunta",
            false,
            false,
        );
        assert_eq!(plan, AnswerPlan::Fallback);
    }

    #[test]
    fn test_intent_entity_substitution() {
        let kb = kb_with_entities();
        let intent = intent_with_entity();
        let selection = Selection::Intent(IntentMatch {
            intent: &intent,
            score: 1.0,
        });
        let plan = plan_from_selection(&selection, &kb, "quem e o chefe do financeiro", true, true);
        match plan {
            AnswerPlan::Direct {
                answer, context, ..
            } => {
                assert_eq!(answer, "O chefe do setor financeiro é Paulo Mendes.");
                assert_eq!(context.as_deref(), Some("chefias"));
            }
            other => panic!("expected direct answer, got {other:?}"),
        }
    }

    #[test]
    fn test_intent_entity_not_identified_asks_for_clarification() {
        let kb = kb_with_entities();
        let intent = intent_with_entity();
        let selection = Selection::Intent(IntentMatch {
            intent: &intent,
            score: 1.0,
        });
        let plan = plan_from_selection(&selection, &kb, "quem e o chefe", true, true);
        match plan {
            AnswerPlan::Direct { answer, .. } => {
                assert!(answer.contains("Não consegui identificar"));
                assert!(answer.contains("setor"));
            }
            other => panic!("expected direct answer, got {other:?}"),
        }
    }

    #[test]
    fn test_build_contents_appends_question() {
        let history = vec![ChatTurn::user("oi"), ChatTurn::model("olá")];
        let contents = build_contents(&history, "qual o valor?");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].text(), "qual o valor?");
    }
}
