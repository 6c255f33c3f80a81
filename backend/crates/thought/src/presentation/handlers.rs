//! HTTP Handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use kernel::id::ThoughtId;
use platform::cache::{MemoryCache, PersistentCache};
use platform::client::client_key;
use platform::clock::Clock;
use platform::kv::KeyValueStore;
use platform::rate_limit::FixedWindowLimiter;
use platform::retry::Sleeper;

use crate::application::clear_cache::ClearCacheUseCase;
use crate::application::config::ThoughtConfig;
use crate::application::daily_thought::DailyThoughtUseCase;
use crate::application::generate_thought::{GenerateThoughtInput, GenerateThoughtUseCase};
use crate::application::get_thought::GetThoughtUseCase;
use crate::application::quota::QuotaUseCase;
use crate::domain::entities::Thought;
use crate::domain::gateway::CompletionGateway;
use crate::domain::value_objects::Mood;
use crate::error::{ThoughtError, ThoughtResult};
use crate::presentation::dto::{
    ClearCacheQuery, ClearCacheResponse, DailyQuery, GenerateRequest, QuotaResponse,
    ThoughtResponse,
};

/// Header carrying the cache admin token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
/// Namespace of persisted cache entries in the key-value store
pub const PERSISTENT_CACHE_NAMESPACE: &str = "cache:";

/// Shared state for thought handlers
pub struct ThoughtAppState<S, G> {
    pub limiter: Arc<FixedWindowLimiter<S>>,
    pub gateway: Option<Arc<G>>,
    pub share_cache: Arc<MemoryCache<Thought>>,
    pub daily_cache: Arc<PersistentCache<S>>,
    pub config: Arc<ThoughtConfig>,
    pub sleeper: Arc<dyn Sleeper>,
}

// Manual impl: a derive would require `S: Clone` and `G: Clone`.
impl<S, G> Clone for ThoughtAppState<S, G> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            gateway: self.gateway.clone(),
            share_cache: self.share_cache.clone(),
            daily_cache: self.daily_cache.clone(),
            config: self.config.clone(),
            sleeper: self.sleeper.clone(),
        }
    }
}

impl<S, G> ThoughtAppState<S, G>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    /// Wire limiter and caches over one store
    pub fn new(
        store: Arc<S>,
        gateway: Option<Arc<G>>,
        config: Arc<ThoughtConfig>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::new(store.clone(), clock.clone())),
            gateway,
            share_cache: Arc::new(MemoryCache::bounded(clock.clone(), config.share_cache_size)),
            daily_cache: Arc::new(PersistentCache::new(store, clock, PERSISTENT_CACHE_NAMESPACE)),
            config,
            sleeper,
        }
    }
}

/// POST /api/thoughts/generate
pub async fn generate_thought<S, G>(
    State(state): State<ThoughtAppState<S, G>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<GenerateRequest>,
) -> ThoughtResult<Json<ThoughtResponse>>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let use_case = GenerateThoughtUseCase::new(
        state.limiter.clone(),
        state.gateway.clone(),
        state.share_cache.clone(),
        state.config.clone(),
        state.sleeper.clone(),
    );

    let input = GenerateThoughtInput {
        topic: req.topic,
        mood: Mood::parse_lossy(req.mood.as_deref()),
        use_remote: req.use_remote,
        client_key: client_key(&headers, Some(addr.ip()), state.config.trust_forwarded_for),
    };

    let thought = use_case.execute(input).await?;

    Ok(Json(thought.into()))
}

/// GET /api/thoughts/{id}
pub async fn get_thought<S, G>(
    State(state): State<ThoughtAppState<S, G>>,
    Path(id): Path<String>,
) -> ThoughtResult<Json<ThoughtResponse>>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let id: ThoughtId = id
        .parse()
        .map_err(|_| ThoughtError::InvalidRequest(format!("malformed thought id: {id}")))?;

    let use_case = GetThoughtUseCase::new(state.share_cache.clone());
    let thought = use_case.execute(id)?;

    Ok(Json(thought.into()))
}

/// GET /api/thoughts/daily
pub async fn daily_thought<S, G>(
    State(state): State<ThoughtAppState<S, G>>,
    Query(query): Query<DailyQuery>,
) -> ThoughtResult<Json<ThoughtResponse>>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let use_case = DailyThoughtUseCase::new(state.daily_cache.clone(), state.config.clone());
    let thought = use_case
        .execute(Mood::parse_lossy(query.mood.as_deref()), query.refresh)
        .await?;

    Ok(Json(thought.into()))
}

/// GET /api/thoughts/quota
pub async fn quota<S, G>(
    State(state): State<ThoughtAppState<S, G>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Json<QuotaResponse>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let use_case = QuotaUseCase::new(state.limiter.clone(), state.config.clone());
    let output = use_case
        .execute(&client_key(&headers, Some(addr.ip()), state.config.trust_forwarded_for))
        .await;

    Json(output.into())
}

/// DELETE /api/thoughts/cache
pub async fn clear_cache<S, G>(
    State(state): State<ThoughtAppState<S, G>>,
    headers: HeaderMap,
    Query(query): Query<ClearCacheQuery>,
) -> ThoughtResult<Json<ClearCacheResponse>>
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let use_case = ClearCacheUseCase::new(
        state.share_cache.clone(),
        state.daily_cache.clone(),
        state.config.clone(),
    );
    let removed = use_case.execute(token, query.prefix.as_deref()).await?;

    Ok(Json(ClearCacheResponse { removed }))
}
