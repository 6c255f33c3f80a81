//! Daily Thought Use Case
//!
//! One template thought per mood, kept in the persistent cache for a day.

use std::sync::Arc;

use platform::cache::{FetchOptions, PersistentCache, cached_fetch};
use platform::kv::KeyValueStore;

use crate::application::config::{ThoughtConfig, daily_key};
use crate::domain::entities::Thought;
use crate::domain::services::generate_local;
use crate::domain::value_objects::Mood;
use crate::error::{ThoughtError, ThoughtResult};

/// Daily thought use case
pub struct DailyThoughtUseCase<S> {
    cache: Arc<PersistentCache<S>>,
    config: Arc<ThoughtConfig>,
}

impl<S> DailyThoughtUseCase<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(cache: Arc<PersistentCache<S>>, config: Arc<ThoughtConfig>) -> Self {
        Self { cache, config }
    }

    /// Cached thought of the day for `mood`; `refresh` replaces it
    pub async fn execute(&self, mood: Mood, refresh: bool) -> ThoughtResult<Thought> {
        let options = FetchOptions::new(self.config.daily_ttl).force_refresh(refresh);

        cached_fetch(self.cache.as_ref(), &daily_key(mood), options, || async move {
            Ok::<_, ThoughtError>(generate_local(None, mood))
        })
        .await
    }
}
