//! Infrastructure Layer
//!
//! Adapters for external services: the completion API and PostgreSQL.

pub mod openai;
pub mod postgres;
