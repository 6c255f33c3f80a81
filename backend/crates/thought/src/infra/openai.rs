//! OpenAI Chat Completion Client

use reqwest::Client;
use serde::Deserialize;

use crate::application::config::RemoteSettings;
use crate::domain::gateway::{Completion, CompletionError, CompletionGateway, CompletionRequest};
use crate::domain::value_objects::ApiKey;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Completion gateway over the OpenAI chat completions endpoint
#[derive(Clone)]
pub struct OpenAiGateway {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl OpenAiGateway {
    pub fn new(settings: &RemoteSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };
            return Err(CompletionError::classify(status.as_u16(), message));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Ok(Completion {
            content: body
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content),
            total_tokens: body.usage.map(|usage| usage.total_tokens),
        })
    }
}

impl std::fmt::Debug for OpenAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
