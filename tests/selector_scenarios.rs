//! End-to-end selection scenarios through the public library API

use std::sync::Arc;

use celine::assistant::plan_from_selection;
use celine::assistant::AnswerPlan;
use celine::assistant::FALLBACK_ANSWER;
use celine::knowledge::KnowledgeBase;
use celine::retrieval::best_fact_by_embedding;
use celine::retrieval::Selection;
use celine::retrieval::SelectionStrategy;
use celine::retrieval::Selector;
use celine::text::normalize;
use celine::text::SynonymExpander;
use celine::unanswered::is_unanswered;

fn sample_kb() -> KnowledgeBase {
    serde_json::from_str(
        r#"{
            "intents": [
                {"tag": "saudacao", "keywords": ["bom dia", "oi"],
                 "answer": "Olá! Como posso ajudar?"},
                {"tag": "vale_refeicao", "keywords": ["vale refeição", "vr"],
                 "answer": "O vale refeição é de R$35/dia.",
                 "context_set": "beneficios"},
                {"tag": "valor_contexto", "keywords": ["valor"],
                 "answer": "Dentro de benefícios, o valor é R$35/dia.",
                 "context_filter": "beneficios"}
            ],
            "fatos": [
                {"topico": "Benefícios", "informacao": "R$35/dia",
                 "palavras_chave": ["vale refeição"]},
                {"topico": "Férias", "informacao": "30 dias corridos",
                 "palavras_chave": ["férias", "descanso"]}
            ]
        }"#,
    )
    .unwrap()
}

fn selector(kb: KnowledgeBase) -> Selector {
    Selector::new(Arc::new(kb), None, 0.65)
}

#[tokio::test]
async fn unrelated_question_yields_no_match() {
    let selector = selector(sample_kb());
    let question = normalize("qual a previsão do tempo amanhã em recife");

    let substring = selector
        .select(&question, None, SelectionStrategy::Substring)
        .await;
    assert!(substring.is_no_match());

    let overlap = selector
        .select(&question, None, SelectionStrategy::SetIntersection)
        .await;
    assert!(overlap.is_no_match());
}

#[tokio::test]
async fn vale_refeicao_scenario_scores_four() {
    let selector = selector(sample_kb());
    let question = normalize("Qual o valor do vale refeição?");

    match selector
        .select(&question, None, SelectionStrategy::Substring)
        .await
    {
        Selection::Intent(m) => {
            assert_eq!(m.intent.tag, "vale_refeicao");
            // two-word phrase, 2^2, priority 1
            assert!((m.score - 4.0).abs() < f32::EPSILON);
        }
        other => panic!("expected intent match, got {other:?}"),
    }
}

#[tokio::test]
async fn context_gated_intent_needs_matching_context() {
    let selector = selector(sample_kb());
    let question = normalize("e qual o valor?");

    // Without the context the gated intent is skipped and nothing matches
    // "valor" elsewhere with a higher score
    match selector
        .select(&question, Some("ferias"), SelectionStrategy::Substring)
        .await
    {
        Selection::NoMatch => {}
        other => panic!("expected no match under foreign context, got {other:?}"),
    }

    match selector
        .select(&question, Some("beneficios"), SelectionStrategy::Substring)
        .await
    {
        Selection::Intent(m) => {
            assert_eq!(m.intent.tag, "valor_contexto");
            assert!((m.score - 1.5).abs() < f32::EPSILON);
        }
        other => panic!("expected gated intent, got {other:?}"),
    }
}

#[tokio::test]
async fn synonym_expansion_feeds_the_selector() {
    let mut synonyms = std::collections::HashMap::new();
    synonyms.insert("vr".to_string(), "vale refeição".to_string());
    let expander = SynonymExpander::new(&synonyms).unwrap();

    let selector = selector(sample_kb());
    let question = expander.expand(&normalize("Qual o valor do VR?"));

    match selector
        .select(&question, None, SelectionStrategy::Substring)
        .await
    {
        Selection::Intent(m) => assert_eq!(m.intent.tag, "vale_refeicao"),
        other => panic!("expected intent match after expansion, got {other:?}"),
    }
}

#[test]
fn embedding_threshold_is_strict() {
    let kb: KnowledgeBase = serde_json::from_str(
        r#"{
            "fatos": [
                {"topico": "A", "informacao": "a", "embedding": [0.65, 0.0]},
                {"topico": "B", "informacao": "b", "embedding": [0.3, 0.1]}
            ]
        }"#,
    )
    .unwrap();

    // Best dot product is exactly 0.65: rejected at the threshold
    assert!(best_fact_by_embedding(&kb.facts, &[1.0, 0.0], 0.65).is_none());
    // Strictly above: accepted
    let m = best_fact_by_embedding(&kb.facts, &[1.0, 0.0], 0.60).unwrap();
    assert_eq!(m.fact.topic, "A");
}

#[test]
fn no_fact_and_empty_history_short_circuits_composer() {
    let kb = sample_kb();
    let plan = plan_from_selection(&Selection::NoMatch, &kb, "pergunta sem resposta", true, true);
    assert_eq!(plan, AnswerPlan::Fallback);
    assert!(is_unanswered(FALLBACK_ANSWER));
}

#[test]
fn dont_know_answer_is_flagged_for_logging() {
    assert!(is_unanswered(
        "Sinto muito, não encontrei essa informação na base de conhecimento."
    ));
    assert!(!is_unanswered("O vale refeição é de R$35/dia."));
}
