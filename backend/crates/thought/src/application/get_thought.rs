//! Get Thought Use Case
//!
//! Looks up a recently generated thought by id for sharing.

use std::sync::Arc;

use kernel::id::ThoughtId;
use platform::cache::MemoryCache;

use crate::application::config::share_key;
use crate::domain::entities::Thought;
use crate::error::{ThoughtError, ThoughtResult};

/// Get thought use case
pub struct GetThoughtUseCase {
    share_cache: Arc<MemoryCache<Thought>>,
}

impl GetThoughtUseCase {
    pub fn new(share_cache: Arc<MemoryCache<Thought>>) -> Self {
        Self { share_cache }
    }

    pub fn execute(&self, id: ThoughtId) -> ThoughtResult<Thought> {
        self.share_cache
            .get(&share_key(&id))
            .ok_or(ThoughtError::NotFound)
    }
}
