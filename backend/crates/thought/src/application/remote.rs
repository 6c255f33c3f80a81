//! Remote Generation
//!
//! Produces a thought through the completion gateway, guarded by the global
//! remote rate window and retried with exponential backoff.

use std::sync::Arc;

use platform::kv::KeyValueStore;
use platform::rate_limit::FixedWindowLimiter;
use platform::retry::{Sleeper, retry_with_backoff};

use crate::application::config::{REMOTE_WINDOW_KEY, RemoteSettings, ThoughtConfig};
use crate::domain::entities::Thought;
use crate::domain::gateway::{
    ChatMessage, Completion, CompletionError, CompletionGateway, CompletionRequest,
};
use crate::domain::services::{strip_wrapping_quotes, system_prompt, user_prompt};
use crate::domain::value_objects::Mood;
use crate::error::{LimitScope, ThoughtError, ThoughtResult};

/// Remote generator
pub struct RemoteGenerator<S, G> {
    limiter: Arc<FixedWindowLimiter<S>>,
    gateway: Arc<G>,
    config: Arc<ThoughtConfig>,
    sleeper: Arc<dyn Sleeper>,
}

impl<S, G> RemoteGenerator<S, G>
where
    S: KeyValueStore + Send + Sync,
    G: CompletionGateway + Send + Sync,
{
    pub fn new(
        limiter: Arc<FixedWindowLimiter<S>>,
        gateway: Arc<G>,
        config: Arc<ThoughtConfig>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            limiter,
            gateway,
            config,
            sleeper,
        }
    }

    /// Generate one thought remotely
    ///
    /// The remote window is consumed once per call, however many attempts
    /// the retry policy makes.
    pub async fn execute(&self, topic: Option<String>, mood: Mood) -> ThoughtResult<Thought> {
        let settings = self
            .config
            .remote_settings()
            .ok_or_else(|| ThoughtError::Internal("remote generation is not configured".into()))?;

        let limit = self
            .limiter
            .check_and_consume(REMOTE_WINDOW_KEY, &self.config.remote_rate_limit)
            .await;
        if !limit.allowed {
            return Err(ThoughtError::RateLimited {
                scope: LimitScope::Remote,
                reset_at_ms: limit.reset_at_ms,
                retry_after_secs: limit.retry_after_secs(),
            });
        }

        let request = build_request(settings, topic.as_deref(), mood);
        let request = &request;
        let gateway = self.gateway.as_ref();

        let (content, total_tokens) = retry_with_backoff(
            &self.config.retry_policy,
            self.sleeper.as_ref(),
            move |attempt| async move {
                tracing::debug!(attempt, model = %request.model, "Requesting completion");
                let completion = gateway.complete(request).await?;
                extract_content(completion)
            },
        )
        .await?;

        let thought = Thought::from_completion(
            &content,
            topic,
            mood,
            total_tokens,
            total_tokens.map(|tokens| settings.cost_for(tokens)),
        );

        tracing::info!(
            thought_id = %thought.id,
            mood = %mood,
            tokens_used = ?total_tokens,
            remaining = limit.remaining,
            "Remote thought generated"
        );

        Ok(thought)
    }
}

/// Build the chat request for a mood and optional topic
pub fn build_request(settings: &RemoteSettings, topic: Option<&str>, mood: Mood) -> CompletionRequest {
    CompletionRequest {
        model: settings.model.clone(),
        messages: vec![
            ChatMessage::system(system_prompt(mood)),
            ChatMessage::user(user_prompt(topic)),
        ],
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        presence_penalty: settings.presence_penalty,
        frequency_penalty: settings.frequency_penalty,
        stop: settings.stop.clone(),
    }
}

/// Unquoted, non-empty text of the first choice
fn extract_content(completion: Completion) -> Result<(String, Option<u32>), CompletionError> {
    let text = completion.content.unwrap_or_default();
    let text = strip_wrapping_quotes(&text);
    if text.is_empty() {
        return Err(CompletionError::InvalidResponse(
            "completion contained no text".into(),
        ));
    }
    Ok((text.to_string(), completion.total_tokens))
}
