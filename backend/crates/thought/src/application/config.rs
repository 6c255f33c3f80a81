//! Application Configuration
//!
//! Configuration for the thought application layer.

use std::time::Duration;

use platform::crypto::sha256;
use platform::rate_limit::RateLimitConfig;
use platform::retry::RetryPolicy;

use crate::domain::value_objects::ApiKey;

/// Rate window key prefix for local generation; the client key is appended
pub const LOCAL_WINDOW_PREFIX: &str = "local_generation";
/// Single global rate window for remote generation
pub const REMOTE_WINDOW_KEY: &str = "remote_api";
/// Share cache key prefix; the thought id is appended
pub const SHARE_KEY_PREFIX: &str = "thought:";
/// Daily thought cache key prefix; the mood is appended
pub const DAILY_KEY_PREFIX: &str = "daily:";

/// Completion API settings, present only when a valid key is configured
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub api_key: ApiKey,
    pub model: String,
    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub stop: Vec<String>,
    /// USD per 1000 tokens, for the cost estimate
    pub price_per_1k_tokens: f64,
    pub request_timeout: Duration,
}

impl RemoteSettings {
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            max_tokens: 100,
            temperature: 0.9,
            presence_penalty: 0.6,
            frequency_penalty: 0.5,
            stop: vec!["\n\n".to_string(), "Human:".to_string(), "AI:".to_string()],
            price_per_1k_tokens: 0.002,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Estimated cost of a completion in USD
    pub fn cost_for(&self, total_tokens: u32) -> f64 {
        total_tokens as f64 / 1000.0 * self.price_per_1k_tokens
    }
}

/// Thought application configuration
#[derive(Debug, Clone)]
pub struct ThoughtConfig {
    /// Per-client window for template generation
    pub local_rate_limit: RateLimitConfig,
    /// Global window for completion API calls
    pub remote_rate_limit: RateLimitConfig,
    /// Never call the completion API, even when requested
    pub force_local: bool,
    /// Key local windows by `X-Forwarded-For`; enable only behind a proxy
    /// that overwrites the header
    pub trust_forwarded_for: bool,
    pub remote: Option<RemoteSettings>,
    pub retry_policy: RetryPolicy,
    /// Capacity of the in-memory share cache
    pub share_cache_size: usize,
    pub share_cache_ttl: Duration,
    pub daily_ttl: Duration,
    /// SHA-256 of the cache admin token; cache administration is off when unset
    pub admin_token_digest: Option<[u8; 32]>,
}

impl Default for ThoughtConfig {
    fn default() -> Self {
        Self {
            local_rate_limit: RateLimitConfig::new(10, 60),
            remote_rate_limit: RateLimitConfig::from_hours(50, 24),
            force_local: false,
            trust_forwarded_for: false,
            remote: None,
            retry_policy: RetryPolicy::default(),
            share_cache_size: 500,
            share_cache_ttl: Duration::from_secs(3600),
            daily_ttl: Duration::from_secs(24 * 3600),
            admin_token_digest: None,
        }
    }
}

impl ThoughtConfig {
    /// Enable remote generation when `raw_key` has the expected shape
    pub fn with_api_key(mut self, raw_key: &str) -> Self {
        self.remote = ApiKey::parse(raw_key).map(RemoteSettings::new);
        self
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token_digest = (!token.is_empty()).then(|| sha256(token.as_bytes()));
        self
    }

    /// Remote settings, if remote generation may be used at all
    pub fn remote_settings(&self) -> Option<&RemoteSettings> {
        if self.force_local {
            return None;
        }
        self.remote.as_ref()
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote_settings().is_some()
    }

    pub fn share_cache_ttl_ms(&self) -> i64 {
        i64::try_from(self.share_cache_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn daily_ttl_ms(&self) -> i64 {
        i64::try_from(self.daily_ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

pub fn local_window_key(client_key: &str) -> String {
    format!("{LOCAL_WINDOW_PREFIX}:{client_key}")
}

pub fn share_key(id: &impl std::fmt::Display) -> String {
    format!("{SHARE_KEY_PREFIX}{id}")
}

pub fn daily_key(mood: crate::domain::value_objects::Mood) -> String {
    format!("{DAILY_KEY_PREFIX}{mood}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Mood;

    const KEY: &str = "sk-abcdefghijklmnopqrstuvwxyz";

    #[test]
    fn test_defaults() {
        let config = ThoughtConfig::default();
        assert_eq!(config.local_rate_limit.max_requests, 10);
        assert_eq!(config.local_rate_limit.window_ms(), 60_000);
        assert_eq!(config.remote_rate_limit.max_requests, 50);
        assert_eq!(config.remote_rate_limit.window_ms(), 24 * 3_600_000);
        assert_eq!(config.retry_policy.max_attempts, 3);
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_api_key_enables_remote() {
        let config = ThoughtConfig::default().with_api_key(KEY);
        assert!(config.remote_enabled());

        let config = ThoughtConfig::default().with_api_key("not-a-key");
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_force_local_disables_remote() {
        let config = ThoughtConfig {
            force_local: true,
            ..ThoughtConfig::default().with_api_key(KEY)
        };
        assert!(config.remote.is_some());
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_cost_estimate() {
        let settings = RemoteSettings::new(ApiKey::parse(KEY).unwrap());
        assert!((settings.cost_for(1500) - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings =
            RemoteSettings::new(ApiKey::parse(KEY).unwrap()).with_base_url("http://localhost:9/v1/");
        assert_eq!(settings.base_url, "http://localhost:9/v1");
    }

    #[test]
    fn test_keys() {
        assert_eq!(local_window_key("10.0.0.1"), "local_generation:10.0.0.1");
        assert_eq!(daily_key(Mood::Humorous), "daily:humorous");
        assert_eq!(share_key(&"abc"), "thought:abc");
    }

    #[test]
    fn test_empty_admin_token_keeps_admin_off() {
        assert!(ThoughtConfig::default().with_admin_token("").admin_token_digest.is_none());
        assert!(ThoughtConfig::default().with_admin_token("s3cret").admin_token_digest.is_some());
    }
}
