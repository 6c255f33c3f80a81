//! Completion Gateway Port
//!
//! Abstract interface to a chat-completion service.
//! Implementation is in the infra layer.

use platform::retry::Retryable;
use serde::Serialize;

/// Message author in a chat completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion request; serializes to the wire body as-is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub stop: Vec<String>,
}

/// First choice of a completion response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub total_tokens: Option<u32>,
}

/// Completion failure taxonomy
///
/// Credential and account problems are final; everything else may succeed
/// on a later attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("Invalid API key: {0}")]
    Unauthorized(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Billing problem: {0}")]
    Billing(String),

    #[error("Completion service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unusable completion: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Classify a non-2xx response from its status and error message
    pub fn classify(status: u16, message: String) -> Self {
        let lowered = message.to_ascii_lowercase();
        if status == 401 || lowered.contains("api key") {
            Self::Unauthorized(message)
        } else if lowered.contains("quota") {
            Self::QuotaExceeded(message)
        } else if lowered.contains("billing") {
            Self::Billing(message)
        } else {
            Self::Service { status, message }
        }
    }
}

impl Retryable for CompletionError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::Network(_) | Self::InvalidResponse(_)
        )
    }
}

/// Completion gateway trait
#[trait_variant::make(CompletionGateway: Send)]
pub trait LocalCompletionGateway {
    /// Send one completion request; no retries at this level
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_status_and_message() {
        assert!(matches!(
            CompletionError::classify(401, "nope".into()),
            CompletionError::Unauthorized(_)
        ));
        assert!(matches!(
            CompletionError::classify(400, "Incorrect API key provided".into()),
            CompletionError::Unauthorized(_)
        ));
        assert!(matches!(
            CompletionError::classify(429, "You exceeded your current quota".into()),
            CompletionError::QuotaExceeded(_)
        ));
        assert!(matches!(
            CompletionError::classify(402, "Billing hard limit reached".into()),
            CompletionError::Billing(_)
        ));
        assert_eq!(
            CompletionError::classify(500, "boom".into()),
            CompletionError::Service {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(CompletionError::Network("reset".into()).is_transient());
        assert!(CompletionError::InvalidResponse("empty".into()).is_transient());
        assert!(CompletionError::classify(503, "overloaded".into()).is_transient());
        assert!(!CompletionError::Unauthorized("x".into()).is_transient());
        assert!(!CompletionError::QuotaExceeded("x".into()).is_transient());
        assert!(!CompletionError::Billing("x".into()).is_transient());
    }

    #[test]
    fn test_request_wire_shape() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("usr")],
            max_tokens: 100,
            temperature: 0.9,
            presence_penalty: 0.6,
            frequency_penalty: 0.5,
            stop: vec!["\n\n".into()],
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["stop"][0], "\n\n");
    }
}
