//! Unanswered-question logging
//!
//! When a composed answer admits it could not help, one row
//! `(timestamp, user_name, question)` is appended to an external spreadsheet
//! via webhook. The question is forwarded as originally typed, not the
//! normalized form. Failures are logged and swallowed; they never affect the
//! HTTP response.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::SheetConfig;
use crate::errors::CelineError;
use crate::errors::Result;

/// Phrases that mark an answer as a non-answer. Compared case-insensitively
/// as substrings of the final answer text.
pub const UNANSWERED_MARKERS: &[&str] = &[
    "não encontrei essa informação",
    "não entendi sua pergunta",
    "não tenho essa informação",
    "não sei responder",
];

/// Whether the final answer text admits the question went unanswered
pub fn is_unanswered(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    UNANSWERED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[derive(Serialize)]
struct SheetRow<'a> {
    timestamp: String,
    user_name: &'a str,
    question: &'a str,
}

/// Appends unanswered questions to the configured spreadsheet webhook
pub struct UnansweredLogger {
    client: Client,
    webhook_url: String,
}

impl UnansweredLogger {
    /// # Errors
    /// - Missing webhook URL
    /// - HTTP client build errors
    pub fn new(config: &SheetConfig) -> Result<Self> {
        if config.webhook_url.is_empty() {
            return Err(CelineError::Config(
                "Sheet webhook URL not configured (set sheet.webhook_url or SHEET_WEBHOOK_URL)"
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CelineError::Http(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    /// Append one row with the current timestamp
    pub async fn record(&self, user_name: &str, question: &str) -> Result<()> {
        let row = SheetRow {
            timestamp: Utc::now().to_rfc3339(),
            user_name,
            question,
        };
        debug!("Appending unanswered question for {user_name}");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&row)
            .send()
            .await
            .map_err(|e| CelineError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CelineError::Sheet(format!(
                "Webhook error ({})",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_marker_case_insensitively() {
        assert!(is_unanswered(
            "Desculpe, Não Encontrei Essa Informação na base."
        ));
        assert!(is_unanswered("Desculpe, não entendi sua pergunta."));
    }

    #[test]
    fn test_ordinary_answer_is_not_flagged() {
        assert!(!is_unanswered("O vale refeição é de R$35/dia."));
    }

    #[test]
    fn test_missing_webhook_is_config_error() {
        let config = SheetConfig::default();
        assert!(matches!(
            UnansweredLogger::new(&config),
            Err(CelineError::Config(_))
        ));
    }
}
