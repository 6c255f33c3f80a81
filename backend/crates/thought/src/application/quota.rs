//! Quota Use Case
//!
//! Reports the caller's rate windows without consuming them.

use std::sync::Arc;

use platform::kv::KeyValueStore;
use platform::rate_limit::{FixedWindowLimiter, RateLimitConfig, RateLimitResult};

use crate::application::config::{REMOTE_WINDOW_KEY, ThoughtConfig, local_window_key};

/// State of one rate window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl WindowQuota {
    fn new(config: &RateLimitConfig, result: RateLimitResult) -> Self {
        Self {
            limit: config.max_requests,
            remaining: result.remaining,
            reset_at_ms: result.reset_at_ms,
        }
    }
}

/// Output of quota use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaOutput {
    pub local: WindowQuota,
    /// `None` when remote generation is not available
    pub remote: Option<WindowQuota>,
}

/// Quota use case
pub struct QuotaUseCase<S> {
    limiter: Arc<FixedWindowLimiter<S>>,
    config: Arc<ThoughtConfig>,
}

impl<S> QuotaUseCase<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(limiter: Arc<FixedWindowLimiter<S>>, config: Arc<ThoughtConfig>) -> Self {
        Self { limiter, config }
    }

    pub async fn execute(&self, client_key: &str) -> QuotaOutput {
        let local_config = &self.config.local_rate_limit;
        let local = self
            .limiter
            .peek(&local_window_key(client_key), local_config)
            .await;

        let remote = if self.config.remote_enabled() {
            let remote_config = &self.config.remote_rate_limit;
            let result = self.limiter.peek(REMOTE_WINDOW_KEY, remote_config).await;
            Some(WindowQuota::new(remote_config, result))
        } else {
            None
        };

        QuotaOutput {
            local: WindowQuota::new(local_config, local),
            remote,
        }
    }
}
