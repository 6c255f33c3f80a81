//! Rate Limiting Infrastructure
//!
//! Fixed-window request counting persisted in a [`KeyValueStore`].
//!
//! One generic limiter serves every purpose; callers pick the window key
//! (`local_generation:<client>`, `remote_api`, ...) and the quota.
//!
//! ## Window rules
//! - No stored window, or `now > resetTime`: start a fresh window with
//!   `count = 1`, allowed
//! - `count < max_requests`: increment, allowed
//! - otherwise: denied, carrying the window's `resetTime`
//!
//! Storage failures never block a request: they are logged and the request
//! is allowed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::kv::{KeyValueStore, StoreError};

/// Storage key prefix for persisted windows
pub const WINDOW_KEY_PREFIX: &str = "rate_limit:";

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// `max_requests` is clamped to at least 1
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn from_hours(max_requests: u32, hours: u64) -> Self {
        Self::new(max_requests, hours.saturating_mul(3600))
    }

    /// Window length in millis, saturating at `i64::MAX`
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Rate limit check result
///
/// A denied request is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
    /// Millis until the window reopens, measured on the limiter's clock
    pub resets_in_ms: i64,
}

impl RateLimitResult {
    fn new(allowed: bool, remaining: u32, reset_at_ms: i64, now_ms: i64) -> Self {
        Self {
            allowed,
            remaining,
            reset_at_ms,
            resets_in_ms: reset_at_ms.saturating_sub(now_ms).max(0),
        }
    }

    /// Whole seconds until the window reopens, rounded up
    pub fn retry_after_secs(&self) -> u64 {
        (self.resets_in_ms.max(0) as u64).div_ceil(1000)
    }
}

/// Persisted window state, stored as `{"count":..,"resetTime":..}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    pub count: u32,
    /// Epoch millis at which the window expires
    pub reset_time: i64,
}

impl RateWindow {
    pub fn fresh(now_ms: i64, window_ms: i64) -> Self {
        Self {
            count: 1,
            reset_time: now_ms.saturating_add(window_ms),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.reset_time
    }
}

/// Fixed-window limiter over a key-value store
///
/// The read-modify-write of a window runs under an async mutex owned by the
/// limiter, so concurrent requests inside one process never lose updates.
/// Share one limiter instance per store.
pub struct FixedWindowLimiter<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    guard: Mutex<()>,
}

impl<S> FixedWindowLimiter<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            guard: Mutex::new(()),
        }
    }

    /// Check the window for `key` and count this request if admitted
    pub async fn check_and_consume(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let _guard = self.guard.lock().await;
        let now = self.clock.now_ms();
        let storage_key = storage_key(key);

        let current = match self.load(&storage_key).await {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Rate window unreadable, allowing request");
                return RateLimitResult::new(
                    true,
                    config.max_requests.saturating_sub(1),
                    now.saturating_add(config.window_ms()),
                    now,
                );
            }
        };

        let next = match current {
            Some(window) if !window.is_expired(now) => {
                if window.count >= config.max_requests {
                    tracing::warn!(
                        key = %key,
                        count = window.count,
                        max = config.max_requests,
                        "Rate limit exceeded"
                    );
                    return RateLimitResult::new(false, 0, window.reset_time, now);
                }
                RateWindow {
                    count: window.count + 1,
                    reset_time: window.reset_time,
                }
            }
            _ => RateWindow::fresh(now, config.window_ms()),
        };

        if let Err(e) = self.save(&storage_key, &next).await {
            tracing::warn!(key = %key, error = %e, "Failed to persist rate window");
        }

        RateLimitResult::new(
            true,
            config.max_requests.saturating_sub(next.count),
            next.reset_time,
            now,
        )
    }

    /// Remaining quota for `key` without consuming any of it
    pub async fn peek(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now = self.clock.now_ms();
        let window = match self.load(&storage_key(key)).await {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Rate window unreadable");
                None
            }
        };

        match window {
            Some(window) if !window.is_expired(now) => {
                let remaining = config.max_requests.saturating_sub(window.count);
                RateLimitResult::new(remaining > 0, remaining, window.reset_time, now)
            }
            _ => RateLimitResult::new(
                true,
                config.max_requests,
                now.saturating_add(config.window_ms()),
                now,
            ),
        }
    }

    /// Forget the window for `key`
    pub async fn reset(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.guard.lock().await;
        self.store.remove(&storage_key(key)).await
    }

    async fn load(&self, storage_key: &str) -> Result<Option<RateWindow>, StoreError> {
        let Some(raw) = self.store.get(storage_key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<RateWindow>(&raw) {
            Ok(window) => Ok(Some(window)),
            Err(e) => {
                // Corrupt windows are replaced by a fresh one
                tracing::debug!(key = %storage_key, error = %e, "Discarding malformed rate window");
                Ok(None)
            }
        }
    }

    async fn save(&self, storage_key: &str, window: &RateWindow) -> Result<(), StoreError> {
        let raw = serde_json::to_string(window).map_err(StoreError::backend)?;
        self.store.set(storage_key, &raw).await
    }
}

fn storage_key(key: &str) -> String {
    format!("{WINDOW_KEY_PREFIX}{key}")
}
