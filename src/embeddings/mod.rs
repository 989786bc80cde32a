//! Embedding generation module
//!
//! Wraps the external embedding API used by the semantic retrieval strategy
//! and by the offline precompute step that stamps each knowledge-base fact
//! with its vector.

pub mod client;
pub mod precompute;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use precompute::precompute_embeddings;

use crate::errors::Result;
use crate::CelineError;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let provider = match config.embeddings.provider.as_str() {
            "gemini" => EmbeddingProvider::Gemini,
            "ollama" => EmbeddingProvider::Ollama,
            other => {
                return Err(CelineError::Config(format!(
                    "Unknown embedding provider '{other}' (expected gemini or ollama)"
                )))
            }
        };

        Ok(Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.clone(),
            api_key: if config.embeddings.api_key.is_empty() {
                None
            } else {
                Some(config.embeddings.api_key.clone())
            },
        })
    }
}

/// Service for generating embeddings
pub struct EmbeddingService {
    client: EmbeddingClient,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service from the application config
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config)?)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self { client, config })
    }

    /// Generate embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(CelineError::Embedding("Empty text provided".to_string()));
        }
        self.client.generate(text).await
    }

    /// Configured embedding dimension
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }
}
