//! LLM answer composition
//!
//! The composer is an opaque external collaborator: it receives the selected
//! fact (if any), the conversation history and the question, and returns
//! prose. Single attempt per request; a failure degrades the answer, it is
//! never retried.

pub mod prompts;
pub mod streaming;

pub use prompts::AssistantPrompts;
pub use prompts::PromptTemplate;
pub use streaming::StreamingResponse;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::CelineError;
use crate::errors::Result;
use crate::models::ChatTurn;

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [ChatTurn],
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction<'a>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<crate::models::ChatPart>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    pub(crate) fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default()
    }
}

/// Client for the Gemini `generateContent` API
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: usize,
}

impl LlmService {
    /// Create a new LLM service from the application config
    ///
    /// # Errors
    /// - Missing API key
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.llm.api_key.is_empty() {
            return Err(CelineError::Config(
                "LLM API key not configured (set llm.api_key or GEMINI_API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| CelineError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm.api_key.clone(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
            max_output_tokens: config.llm.max_output_tokens,
        })
    }

    /// Compose an answer from a system instruction and conversation turns
    pub async fn generate(&self, system_instruction: &str, contents: &[ChatTurn]) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        debug!("Calling LLM generateContent with {} turns", contents.len());

        let request = GenerateRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CelineError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CelineError::Llm(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CelineError::Llm(format!("Failed to parse response: {e}")))?;

        let text = result.text();
        if text.is_empty() {
            return Err(CelineError::Llm("No candidate text in response".to_string()));
        }
        Ok(text)
    }

    /// Compose an answer as a stream of text fragments, forwarded in arrival
    /// order with no buffering reordering
    pub async fn generate_stream(
        &self,
        system_instruction: &str,
        contents: &[ChatTurn],
    ) -> Result<StreamingResponse> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.endpoint, self.model, self.api_key
        );
        debug!(
            "Calling LLM streamGenerateContent with {} turns",
            contents.len()
        );

        let request = GenerateRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CelineError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CelineError::Llm(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        Ok(StreamingResponse::new(streaming::text_fragments(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_response_text_concatenates_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Olá"}, {"text": ", tudo bem?"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "Olá, tudo bem?");
    }

    #[test]
    fn test_generate_response_without_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = AppConfig::default();
        assert!(matches!(
            LlmService::new(&config),
            Err(CelineError::Config(_))
        ));
    }
}
