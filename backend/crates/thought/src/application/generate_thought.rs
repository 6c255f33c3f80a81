//! Generate Thought Use Case
//!
//! Enforces the caller's rate window, chooses between template and remote
//! generation, and publishes the result to the share cache.

use std::sync::Arc;

use platform::cache::MemoryCache;
use platform::kv::KeyValueStore;
use platform::rate_limit::FixedWindowLimiter;
use platform::retry::Sleeper;

use crate::application::config::{ThoughtConfig, local_window_key, share_key};
use crate::application::remote::RemoteGenerator;
use crate::domain::entities::Thought;
use crate::domain::gateway::CompletionGateway;
use crate::domain::services::{generate_local, normalize_topic};
use crate::domain::value_objects::Mood;
use crate::error::{LimitScope, ThoughtError, ThoughtResult};

/// Input for generate thought use case
#[derive(Debug, Clone)]
pub struct GenerateThoughtInput {
    pub topic: Option<String>,
    pub mood: Mood,
    pub use_remote: bool,
    /// Identifies the caller's local rate window
    pub client_key: String,
}

/// Generate thought use case
pub struct GenerateThoughtUseCase<S, G> {
    limiter: Arc<FixedWindowLimiter<S>>,
    gateway: Option<Arc<G>>,
    share_cache: Arc<MemoryCache<Thought>>,
    config: Arc<ThoughtConfig>,
    sleeper: Arc<dyn Sleeper>,
}

impl<S, G> GenerateThoughtUseCase<S, G>
where
    S: KeyValueStore + Send + Sync,
    G: CompletionGateway + Send + Sync,
{
    pub fn new(
        limiter: Arc<FixedWindowLimiter<S>>,
        gateway: Option<Arc<G>>,
        share_cache: Arc<MemoryCache<Thought>>,
        config: Arc<ThoughtConfig>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            limiter,
            gateway,
            share_cache,
            config,
            sleeper,
        }
    }

    /// Execute the use case
    ///
    /// Every request first consumes the caller's local window. Remote
    /// generation is then used only when the caller asks for it, remote is
    /// configured and not forced off, and a gateway is wired in. Otherwise
    /// the request is served by templates without surfacing why.
    pub async fn execute(&self, input: GenerateThoughtInput) -> ThoughtResult<Thought> {
        let limit = self
            .limiter
            .check_and_consume(
                &local_window_key(&input.client_key),
                &self.config.local_rate_limit,
            )
            .await;
        if !limit.allowed {
            return Err(ThoughtError::RateLimited {
                scope: LimitScope::Local,
                reset_at_ms: limit.reset_at_ms,
                retry_after_secs: limit.retry_after_secs(),
            });
        }

        let topic = normalize_topic(input.topic.as_deref());
        let thought = match self.remote_generator(input.use_remote) {
            Some(remote) => remote.execute(topic, input.mood).await?,
            None => {
                let thought = generate_local(topic.as_deref(), input.mood);
                tracing::info!(
                    thought_id = %thought.id,
                    mood = %input.mood,
                    client = %input.client_key,
                    remaining = limit.remaining,
                    "Template thought generated"
                );
                thought
            }
        };

        self.share_cache.set(
            &share_key(&thought.id),
            thought.clone(),
            self.config.share_cache_ttl,
        );

        Ok(thought)
    }

    fn remote_generator(&self, use_remote: bool) -> Option<RemoteGenerator<S, G>> {
        if !use_remote || !self.config.remote_enabled() {
            return None;
        }
        let gateway = self.gateway.clone()?;
        Some(RemoteGenerator::new(
            self.limiter.clone(),
            gateway,
            self.config.clone(),
            self.sleeper.clone(),
        ))
    }
}
