//! TTL Caches
//!
//! Two stores share one contract ([`Cache`]):
//! - [`MemoryCache`] keeps entries in process memory, optionally bounded.
//!   When full, inserting a new key evicts the oldest *inserted* entry
//!   (insertion order, not LRU; reads do not refresh position).
//! - [`PersistentCache`] keeps entries in a [`KeyValueStore`] as JSON
//!   `{"data":..,"timestamp":..,"ttl":..}` under a namespace prefix.
//!
//! An entry is visible while `now - timestamp <= ttl`. Expired entries are
//! removed lazily when touched; there is no background sweep.
//!
//! Storage problems are never surfaced: they are logged and read as misses.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::kv::KeyValueStore;

/// A cached value with its insertion instant and lifetime (both millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
    pub ttl: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now_ms: i64, ttl: Duration) -> Self {
        Self {
            data,
            timestamp: now_ms,
            ttl: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) <= self.ttl
    }
}

/// Options for [`cached_fetch`]
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub ttl: Duration,
    /// Skip the lookup and always run the producer
    pub force_refresh: bool,
}

impl FetchOptions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            force_refresh: false,
        }
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

/// Common cache contract
pub trait Cache<T>: Send + Sync {
    /// Fresh value for `key`; a stale entry is deleted and reported as a miss
    fn get(&self, key: &str) -> impl Future<Output = Option<T>> + Send;

    fn set(&self, key: &str, value: T, ttl: Duration) -> impl Future<Output = ()> + Send;

    fn has(&self, key: &str) -> impl Future<Output = bool> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = ()> + Send;

    /// Returns the number of entries removed
    fn clear(&self) -> impl Future<Output = usize> + Send;

    /// Returns the number of entries removed
    fn clear_by_prefix(&self, prefix: &str) -> impl Future<Output = usize> + Send;
}

/// Return the cached value for `key` or produce, store and return a new one
///
/// Producer failures propagate unchanged and leave the cache untouched.
pub async fn cached_fetch<C, T, E, F, Fut>(
    cache: &C,
    key: &str,
    options: FetchOptions,
    producer: F,
) -> Result<T, E>
where
    C: Cache<T>,
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !options.force_refresh {
        if let Some(hit) = cache.get(key).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(hit);
        }
    }

    let value = producer().await?;
    cache.set(key, value.clone(), options.ttl).await;
    tracing::debug!(key = %key, refreshed = options.force_refresh, "Cache filled");
    Ok(value)
}

// ============================================================================
// In-memory cache
// ============================================================================

struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

impl<T> CacheState<T> {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

/// In-memory TTL cache, optionally capacity bounded
pub struct MemoryCache<T> {
    state: Mutex<CacheState<T>>,
    clock: Arc<dyn Clock>,
    max_size: Option<usize>,
}

impl<T: Clone> MemoryCache<T> {
    /// Unbounded cache
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            clock,
            max_size: None,
        }
    }

    /// Cache holding at most `max_size` entries (at least 1)
    pub fn bounded(clock: Arc<dyn Clock>, max_size: usize) -> Self {
        Self {
            max_size: Some(max_size.max(1)),
            ..Self::new(clock)
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let mut state = self.lock();
        let entry = state.entries.get(key)?;
        if entry.is_fresh(now) {
            return Some(entry.data.clone());
        }
        state.remove(key);
        None
    }

    /// Store `value`; a new key may evict the oldest inserted entry
    ///
    /// Overwriting an existing key keeps its original insertion position.
    pub fn set(&self, key: &str, value: T, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);
        let mut state = self.lock();

        if !state.entries.contains_key(key) {
            if let Some(max_size) = self.max_size {
                while state.entries.len() >= max_size {
                    let Some(oldest) = state.order.pop_front() else {
                        break;
                    };
                    state.entries.remove(&oldest);
                    tracing::debug!(key = %oldest, "Evicted oldest cache entry");
                }
            }
            state.order.push_back(key.to_string());
        }

        state.entries.insert(key.to_string(), entry);
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.order.clear();
        removed
    }

    pub fn clear_by_prefix(&self, prefix: &str) -> usize {
        let mut state = self.lock();
        let doomed: Vec<String> = state
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            state.remove(key);
        }
        doomed.len()
    }

    /// Stored entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }
}

impl<T> Cache<T> for MemoryCache<T>
where
    T: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<T> {
        MemoryCache::get(self, key)
    }

    async fn set(&self, key: &str, value: T, ttl: Duration) {
        MemoryCache::set(self, key, value, ttl)
    }

    async fn has(&self, key: &str) -> bool {
        MemoryCache::has(self, key)
    }

    async fn remove(&self, key: &str) {
        MemoryCache::remove(self, key);
    }

    async fn clear(&self) -> usize {
        MemoryCache::clear(self)
    }

    async fn clear_by_prefix(&self, prefix: &str) -> usize {
        MemoryCache::clear_by_prefix(self, prefix)
    }
}

// ============================================================================
// Persisted cache
// ============================================================================

/// TTL cache persisted in a key-value store
///
/// All keys are stored under `namespace`, so `clear` only touches this
/// cache's entries even when the store is shared with rate windows.
pub struct PersistentCache<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl<S> PersistentCache<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            namespace: namespace.into(),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = self.storage_key(key);
        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if entry.is_fresh(self.clock.now_ms()) => Some(entry.data),
            Ok(_) => {
                self.discard(&storage_key).await;
                None
            }
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Undecodable cache entry discarded");
                self.discard(&storage_key).await;
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let storage_key = self.storage_key(key);
        let raw = match serde_json::to_string(&CacheEntry::new(value, self.clock.now_ms(), ttl)) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Cache entry not serializable");
                return;
            }
        };
        if let Err(e) = self.store.set(&storage_key, &raw).await {
            tracing::warn!(key = %storage_key, error = %e, "Cache write failed");
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key).await.is_some()
    }

    pub async fn remove(&self, key: &str) {
        self.discard(&self.storage_key(key)).await;
    }

    pub async fn clear(&self) -> usize {
        self.clear_by_prefix("").await
    }

    pub async fn clear_by_prefix(&self, prefix: &str) -> usize {
        let full_prefix = self.storage_key(prefix);
        let keys = match self.store.keys_with_prefix(&full_prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(prefix = %full_prefix, error = %e, "Cache scan failed");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.store.remove(&key).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "Cache delete failed"),
            }
        }
        removed
    }

    async fn discard(&self, storage_key: &str) {
        if let Err(e) = self.store.remove(storage_key).await {
            tracing::warn!(key = %storage_key, error = %e, "Cache delete failed");
        }
    }
}

impl<S, T> Cache<T> for PersistentCache<S>
where
    S: KeyValueStore + Send + Sync,
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<T> {
        PersistentCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: T, ttl: Duration) {
        PersistentCache::set(self, key, &value, ttl).await
    }

    async fn has(&self, key: &str) -> bool {
        PersistentCache::has(self, key).await
    }

    async fn remove(&self, key: &str) {
        PersistentCache::remove(self, key).await
    }

    async fn clear(&self) -> usize {
        PersistentCache::clear(self).await
    }

    async fn clear_by_prefix(&self, prefix: &str) -> usize {
        PersistentCache::clear_by_prefix(self, prefix).await
    }
}
