//! Embedding API clients for the supported providers

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::CelineError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Gemini `embedContent` API
    Gemini,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings from the configured provider
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| CelineError::Http(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            client,
        })
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, missing embedding field)
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::Gemini => self.generate_gemini(text).await,
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embedding using the Gemini `embedContent` API
    async fn generate_gemini(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| CelineError::Config("Gemini API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct GeminiPart<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GeminiContent<'a> {
            parts: Vec<GeminiPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequest<'a> {
            model: &'a str,
            content: GeminiContent<'a>,
        }

        #[derive(Deserialize)]
        struct GeminiEmbedding {
            values: Vec<f32>,
        }

        #[derive(Deserialize)]
        struct GeminiResponse {
            embedding: GeminiEmbedding,
        }

        let url = format!(
            "{}/v1beta/{}:embedContent?key={}",
            self.endpoint, self.model, api_key
        );
        debug!("Calling Gemini embeddings API for {} chars", text.len());

        let request = GeminiRequest {
            model: &self.model,
            content: GeminiContent {
                parts: vec![GeminiPart { text }],
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
            return Err(CelineError::Embedding(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CelineError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding.values)
    }

    /// Generate embedding using the Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
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
            return Err(CelineError::Embedding(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| CelineError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_gemini_embedding() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::Gemini,
            "models/text-embedding-004".to_string(),
            "https://generativelanguage.googleapis.com".to_string(),
            std::env::var("GEMINI_API_KEY").ok(),
        )
        .unwrap();

        let embedding = client.generate("Olá, mundo!").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
