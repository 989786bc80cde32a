//! Data model for the knowledge base and conversation payloads

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// One knowledge-base entry for semantic retrieval.
///
/// Identity is the position in the loaded sequence; there is no ID field.
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "topico")]
    pub topic: String,
    #[serde(rename = "informacao")]
    pub information: String,
    #[serde(rename = "palavras_chave", default)]
    pub search_keywords: Vec<String>,
    /// Precomputed offline with `celine embeddings generate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Keyword-matching variant of a fact, carrying an answer template and
/// optional conversation-context gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Unique tag; lookups are first-match-wins with no duplicate
    /// enforcement at load time
    pub tag: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Answer template with `{placeholder}` slots
    pub answer: String,
    /// Only eligible when the caller's current context equals this tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_filter: Option<String>,
    /// Context the caller should carry into the next turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_set: Option<String>,
    /// Entity type to extract from the question and substitute into the
    /// answer template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

/// Entity dictionary: entity type -> (entity name -> associated value)
pub type EntityMap = HashMap<String, HashMap<String, String>>;

/// One message part in the Gemini wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

/// One turn of conversation history, supplied per-request by the caller.
/// Role is "user" or "model"; not persisted by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
