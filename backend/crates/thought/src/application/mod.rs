//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod clear_cache;
pub mod config;
pub mod daily_thought;
pub mod generate_thought;
pub mod get_thought;
pub mod quota;
pub mod remote;
