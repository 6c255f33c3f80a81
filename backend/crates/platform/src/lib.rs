//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Clocks (system and manually driven)
//! - Durable key-value storage abstraction
//! - Fixed-window rate limiting
//! - TTL caches (bounded in-memory and persisted)
//! - Retry with exponential backoff
//! - Client identification and small crypto helpers

pub mod cache;
pub mod client;
pub mod clock;
pub mod crypto;
pub mod kv;
pub mod rate_limit;
pub mod retry;
