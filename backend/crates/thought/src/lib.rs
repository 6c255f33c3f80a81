//! Thought Backend Module - shower thought generation
//!
//! Clean Architecture structure:
//! - `domain/` - Thought entity, moods, template generator, completion port
//! - `application/` - Use cases (generate, share lookup, daily thought, quota, cache admin)
//! - `infra/` - OpenAI completion client, PostgreSQL key-value store
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Generation model
//! - Local path: random per-mood template with the topic substituted
//! - Remote path: chat completion with bounded retries; used only when requested,
//!   configured with a valid key and not forced off
//! - Every request consumes the per-client window `local_generation:<client>`;
//!   the remote path additionally consumes the global `remote_api` window
//! - Generated thoughts are kept briefly in a bounded share cache so they can be
//!   fetched again by id

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{RemoteSettings, ThoughtConfig};
pub use domain::entities::Thought;
pub use domain::value_objects::{ApiKey, Mood, Source};
pub use error::{ThoughtError, ThoughtResult};
pub use infra::openai::OpenAiGateway;
pub use infra::postgres::PgKeyValueStore;
pub use presentation::router::{thought_router, thought_router_with_state};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
