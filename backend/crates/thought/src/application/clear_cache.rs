//! Clear Cache Use Case
//!
//! Admin-only invalidation of the share and daily caches.

use std::sync::Arc;

use platform::cache::{MemoryCache, PersistentCache};
use platform::crypto::verify_token;
use platform::kv::KeyValueStore;

use crate::application::config::ThoughtConfig;
use crate::domain::entities::Thought;
use crate::error::{ThoughtError, ThoughtResult};

/// Clear cache use case
pub struct ClearCacheUseCase<S> {
    share_cache: Arc<MemoryCache<Thought>>,
    daily_cache: Arc<PersistentCache<S>>,
    config: Arc<ThoughtConfig>,
}

impl<S> ClearCacheUseCase<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(
        share_cache: Arc<MemoryCache<Thought>>,
        daily_cache: Arc<PersistentCache<S>>,
        config: Arc<ThoughtConfig>,
    ) -> Self {
        Self {
            share_cache,
            daily_cache,
            config,
        }
    }

    /// Remove every entry, or only those under `prefix`; returns the count removed
    pub async fn execute(&self, token: Option<&str>, prefix: Option<&str>) -> ThoughtResult<usize> {
        let Some(digest) = self.config.admin_token_digest.as_ref() else {
            return Err(ThoughtError::Forbidden("cache administration is disabled".into()));
        };
        if !token.is_some_and(|t| verify_token(t, digest)) {
            return Err(ThoughtError::Forbidden("invalid admin token".into()));
        }

        let removed = match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => {
                self.share_cache.clear_by_prefix(prefix)
                    + self.daily_cache.clear_by_prefix(prefix).await
            }
            None => self.share_cache.clear() + self.daily_cache.clear().await,
        };

        tracing::info!(prefix = ?prefix, removed, "Caches cleared");
        Ok(removed)
    }
}
