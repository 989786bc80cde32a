//! Speech synthesis for composed answers
//!
//! Calls the text-to-speech API, decodes the base64 audio payload and stores
//! it under the served audio directory. The returned URL is relative to the
//! service root.

use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::config::TtsConfig;
use crate::errors::CelineError;
use crate::errors::Result;

/// Client for the `text:synthesize` API
pub struct TtsService {
    client: Client,
    endpoint: String,
    api_key: String,
    voice: String,
    language_code: String,
    audio_dir: PathBuf,
}

impl TtsService {
    /// Create a new TTS service; ensures the audio directory exists
    ///
    /// # Errors
    /// - Missing API key
    /// - Audio directory creation failures
    /// - HTTP client build errors
    pub fn new(config: &TtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(CelineError::Config(
                "TTS API key not configured (set tts.api_key or TTS_API_KEY)".to_string(),
            ));
        }

        let audio_dir = PathBuf::from(&config.audio_dir);
        if !audio_dir.exists() {
            std::fs::create_dir_all(&audio_dir)?;
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| CelineError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            voice: config.voice.clone(),
            language_code: config.language_code.clone(),
            audio_dir,
        })
    }

    /// Directory where synthesized audio files are written
    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Synthesize `text` to an MP3 file and return its relative URL
    pub async fn synthesize(&self, text: &str) -> Result<String> {
        #[derive(Serialize)]
        struct SynthesisInput<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct VoiceSelection<'a> {
            #[serde(rename = "languageCode")]
            language_code: &'a str,
            name: &'a str,
        }

        #[derive(Serialize)]
        struct AudioConfig<'a> {
            #[serde(rename = "audioEncoding")]
            audio_encoding: &'a str,
        }

        #[derive(Serialize)]
        struct SynthesizeRequest<'a> {
            input: SynthesisInput<'a>,
            voice: VoiceSelection<'a>,
            #[serde(rename = "audioConfig")]
            audio_config: AudioConfig<'a>,
        }

        #[derive(Deserialize)]
        struct SynthesizeResponse {
            #[serde(rename = "audioContent")]
            audio_content: String,
        }

        let url = format!("{}/v1/text:synthesize?key={}", self.endpoint, self.api_key);
        debug!("Calling TTS API for {} chars", text.len());

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: &self.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
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
            return Err(CelineError::Tts(format!(
                "TTS API error ({status}): {error_text}"
            )));
        }

        let result: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| CelineError::Tts(format!("Failed to parse response: {e}")))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(&result.audio_content)
            .map_err(|e| CelineError::Tts(format!("Invalid base64 audio payload: {e}")))?;

        let file_name = format!("{}.mp3", Uuid::new_v4());
        let file_path = self.audio_dir.join(&file_name);
        std::fs::write(&file_path, audio)?;

        info!("Synthesized answer audio at {}", file_path.display());
        Ok(format!("/audio/{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = TtsConfig::default();
        assert!(matches!(TtsService::new(&config), Err(CelineError::Config(_))));
    }
}
