use thiserror::Error;

#[derive(Error, Debug)]
pub enum CelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Speech synthesis error: {0}")]
    Tts(String),

    #[error("Sheet logging error: {0}")]
    Sheet(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CelineError::Config("missing api key".to_string());
        assert_eq!(error.to_string(), "Configuration error: missing api key");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: CelineError = io.into();
        assert!(matches!(error, CelineError::Io(_)));
    }
}
