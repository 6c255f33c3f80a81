//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Thought)
//! - Domain value objects (Mood, Source, ApiKey)
//! - Domain services (template generation, content shaping)
//! - The completion gateway port (implemented in infra)

pub mod entities;
pub mod gateway;
pub mod services;
pub mod value_objects;
