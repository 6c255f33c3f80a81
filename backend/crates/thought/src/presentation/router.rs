//! Thought Router

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use platform::clock::SystemClock;
use platform::kv::KeyValueStore;
use platform::retry::TokioSleeper;

use crate::application::config::ThoughtConfig;
use crate::domain::gateway::CompletionGateway;
use crate::presentation::handlers::{self, ThoughtAppState};

/// Create the thought router over any store and completion gateway
///
/// Pass `None` as the gateway to serve templates only.
pub fn thought_router<S, G>(store: S, gateway: Option<G>, config: ThoughtConfig) -> Router
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    let state = ThoughtAppState::new(
        Arc::new(store),
        gateway.map(Arc::new),
        Arc::new(config),
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
    );

    thought_router_with_state(state)
}

/// Create the thought router from pre-built state
pub fn thought_router_with_state<S, G>(state: ThoughtAppState<S, G>) -> Router
where
    S: KeyValueStore + Send + Sync + 'static,
    G: CompletionGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/generate", post(handlers::generate_thought::<S, G>))
        .route("/daily", get(handlers::daily_thought::<S, G>))
        .route("/quota", get(handlers::quota::<S, G>))
        .route("/cache", delete(handlers::clear_cache::<S, G>))
        .route("/{id}", get(handlers::get_thought::<S, G>))
        .with_state(state)
}
