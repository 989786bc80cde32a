//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::ChatTurn;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Ask request body
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Absent or blank question is a 400, not a deserialization failure
    #[serde(default)]
    pub question: Option<String>,
    /// Context tag carried over from the previous turn
    #[serde(default)]
    pub context: Option<String>,
    /// Conversation history in the Gemini wire format
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
}

/// Ask response body
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub context: Option<String>,
    pub follow_up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_accepts_missing_fields() {
        let req: AskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.question.is_none());
        assert!(req.history.is_none());
    }

    #[test]
    fn test_ask_request_parses_history() {
        let req: AskRequest = serde_json::from_str(
            r#"{
                "question": "e quanto custa?",
                "context": "beneficios",
                "userName": "Maria",
                "history": [
                    {"role": "user", "parts": [{"text": "oi"}]},
                    {"role": "model", "parts": [{"text": "olá"}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(req.question.as_deref(), Some("e quanto custa?"));
        assert_eq!(req.user_name.as_deref(), Some("Maria"));
        assert_eq!(req.history.unwrap().len(), 2);
    }

    #[test]
    fn test_ask_response_omits_audio_when_absent() {
        let response = AskResponse {
            answer: "ok".to_string(),
            context: None,
            follow_up: None,
            audio_url: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("audio_url"));
        assert!(json.contains("\"context\":null"));
    }
}
