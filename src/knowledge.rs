//! Knowledge base loading and lookup
//!
//! The knowledge base is read once at startup from a static JSON file and
//! held as process-wide immutable state. There is no reload path and no
//! mutation after load. A missing file yields an empty store with a logged
//! warning; the service still boots.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::models::EntityMap;
use crate::models::Fact;
use crate::models::Intent;
use crate::text::normalize;
use crate::CelineError;
use crate::Result;

/// In-memory knowledge base: intents for keyword matching, facts for
/// semantic retrieval, entity dictionaries for template filling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(rename = "fatos", default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub entities: EntityMap,
}

impl KnowledgeBase {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CelineError::Io)?;
        let kb: KnowledgeBase = serde_json::from_str(&content).map_err(|e| {
            CelineError::Knowledge(format!(
                "Failed to parse {}: {e}",
                path.as_ref().display()
            ))
        })?;
        info!(
            "Loaded knowledge base: {} intents, {} facts, {} entity types",
            kb.intents.len(),
            kb.facts.len(),
            kb.entities.len()
        );
        Ok(kb)
    }

    /// Load from a JSON file, falling back to an empty store when the file
    /// is missing so the service can still boot
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(&path) {
            Ok(kb) => kb,
            Err(CelineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Knowledge base file {} not found, starting with an empty store",
                    path.as_ref().display()
                );
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load knowledge base: {e}, starting with an empty store");
                Self::default()
            }
        }
    }

    /// First intent carrying the tag; duplicates are not rejected at load
    /// time, the first one wins
    pub fn intent_by_tag(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    /// Scan a normalized question for a known entity of the given type.
    ///
    /// Returns the entity name as spelled in the dictionary plus its
    /// associated value. Longer names are tried first so "recursos humanos"
    /// wins over "recursos".
    pub fn extract_entity(
        &self,
        normalized_question: &str,
        entity_type: &str,
    ) -> Option<(String, String)> {
        let values = self.entities.get(entity_type)?;

        let mut names: Vec<&String> = values.keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        for name in names {
            if normalized_question.contains(&normalize(name)) {
                return Some((name.clone(), values[name].clone()));
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty() && self.facts.is_empty()
    }
}

/// Load the flat informal-term -> canonical-term synonym map.
/// Missing file yields an empty map, same policy as the knowledge base.
pub fn load_synonyms<P: AsRef<Path>>(path: P) -> HashMap<String, String> {
    match std::fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
            Ok(map) => {
                info!("Loaded {} synonym entries", map.len());
                map
            }
            Err(e) => {
                warn!("Failed to parse synonym file: {e}, continuing without synonyms");
                HashMap::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Synonym file {} not found, continuing without synonyms",
                path.as_ref().display()
            );
            HashMap::new()
        }
        Err(e) => {
            warn!("Failed to read synonym file: {e}, continuing without synonyms");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_intents_and_facts() {
        let file = write_temp(
            r#"{
                "intents": [
                    {"tag": "saudacao", "keywords": ["bom dia"], "answer": "Olá!"}
                ],
                "fatos": [
                    {"topico": "Benefícios", "informacao": "R$35/dia",
                     "palavras_chave": ["vale refeição"]}
                ]
            }"#,
        );
        let kb = KnowledgeBase::from_file(file.path()).unwrap();
        assert_eq!(kb.intents.len(), 1);
        assert_eq!(kb.facts.len(), 1);
        assert_eq!(kb.facts[0].topic, "Benefícios");
    }

    #[test]
    fn test_missing_file_yields_empty_store() {
        let kb = KnowledgeBase::load_or_empty("does-not-exist.json");
        assert!(kb.is_empty());
    }

    #[test]
    fn test_intent_by_tag_first_match_wins() {
        let file = write_temp(
            r#"{
                "intents": [
                    {"tag": "dup", "keywords": [], "answer": "first"},
                    {"tag": "dup", "keywords": [], "answer": "second"}
                ]
            }"#,
        );
        let kb = KnowledgeBase::from_file(file.path()).unwrap();
        assert_eq!(kb.intent_by_tag("dup").unwrap().answer, "first");
        assert!(kb.intent_by_tag("nope").is_none());
    }

    #[test]
    fn test_extract_entity_longest_name_first() {
        let file = write_temp(
            r#"{
                "entities": {
                    "setor": {
                        "recursos": "Ana",
                        "recursos humanos": "Carla Souza"
                    }
                }
            }"#,
        );
        let kb = KnowledgeBase::from_file(file.path()).unwrap();
        let (name, value) = kb
            .extract_entity("quem e o chefe de recursos humanos?", "setor")
            .unwrap();
        assert_eq!(name, "recursos humanos");
        assert_eq!(value, "Carla Souza");
    }

    #[test]
    fn test_extract_entity_accent_insensitive() {
        let file = write_temp(
            r#"{
                "entities": {
                    "setor": {"Tecnologia da Informação": "Marcos Lima"}
                }
            }"#,
        );
        let kb = KnowledgeBase::from_file(file.path()).unwrap();
        let hit = kb.extract_entity("chefe de tecnologia da informacao", "setor");
        assert!(hit.is_some());
    }

    #[test]
    fn test_load_synonyms_missing_file() {
        assert!(load_synonyms("nope.json").is_empty());
    }
}
