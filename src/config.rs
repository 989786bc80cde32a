use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the knowledge base JSON file (intents and/or facts)
    pub path: String,
    /// Optional flat JSON object mapping informal terms to canonical terms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Selection strategy: "substring", "set" or "embedding"
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Minimum similarity score an embedding match must strictly exceed
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_strategy() -> String {
    "substring".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.65
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> usize {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Embedding provider: "gemini" or "ollama"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_provider() -> String {
    "gemini".to_string()
}

fn default_embedding_model() -> String {
    "models/text-embedding-004".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// When true a synthesis failure fails the whole /ask request with 500
    /// instead of degrading to a text-only answer
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tts_voice")]
    pub voice: String,
    #[serde(default = "default_tts_language")]
    pub language_code: String,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
}

fn default_tts_endpoint() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_tts_voice() -> String {
    "pt-BR-Wavenet-C".to_string()
}

fn default_tts_language() -> String {
    "pt-BR".to_string()
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mandatory: false,
            endpoint: default_tts_endpoint(),
            api_key: String::new(),
            voice: default_tts_voice(),
            language_code: default_tts_language(),
            audio_dir: default_audio_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Webhook that accepts one appended row per POST
    #[serde(default)]
    pub webhook_url: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::CelineError::Io)?;

        let mut config: AppConfig =
            toml::from_str(&content).map_err(crate::CelineError::TomlParsing)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::CelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// API keys may be supplied via environment instead of the config file.
    /// A key set in the file wins; the environment fills in the blanks.
    /// Read once at startup.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if self.llm.api_key.is_empty() {
                self.llm.api_key = key.clone();
            }
            if self.embeddings.api_key.is_empty() {
                self.embeddings.api_key = key;
            }
        }
        if let Ok(key) = std::env::var("TTS_API_KEY") {
            if self.tts.api_key.is_empty() {
                self.tts.api_key = key;
            }
        }
        if let Ok(url) = std::env::var("SHEET_WEBHOOK_URL") {
            if self.sheet.webhook_url.is_empty() {
                self.sheet.webhook_url = url;
            }
        }
    }

    /// Get knowledge base file path
    pub fn knowledge_path(&self) -> &str {
        &self.knowledge.path
    }

    /// Get synonym file path, if configured
    pub fn synonyms_path(&self) -> Option<&str> {
        self.knowledge.synonyms_path.as_deref()
    }

    /// Get confidence threshold for embedding matches
    pub fn confidence_threshold(&self) -> f32 {
        self.retrieval.confidence_threshold
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                enable_cors: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            knowledge: KnowledgeConfig {
                path: "knowledge_base.json".to_string(),
                synonyms_path: Some("sinonimos.json".to_string()),
            },
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig {
                enabled: true,
                endpoint: default_gemini_endpoint(),
                api_key: String::new(),
                model: default_llm_model(),
                temperature: default_temperature(),
                max_output_tokens: default_max_output_tokens(),
            },
            embeddings: EmbeddingsConfig {
                provider: default_embedding_provider(),
                endpoint: default_gemini_endpoint(),
                api_key: String::new(),
                model: default_embedding_model(),
                dimension: default_embedding_dimension(),
            },
            tts: TtsConfig::default(),
            sheet: SheetConfig::default(),
        }
    }
}
