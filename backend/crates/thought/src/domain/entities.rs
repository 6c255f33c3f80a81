//! Domain Entities
//!
//! Core business entities for the thought domain.

use chrono::{DateTime, Utc};
use kernel::id::ThoughtId;
use serde::{Deserialize, Serialize};

use super::services::truncate_content;
use super::value_objects::{Mood, Source};

/// Thought entity - one generated shower thought
///
/// Content never exceeds the display limit; constructors truncate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: ThoughtId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub topic: Option<String>,
    pub mood: Mood,
    pub is_favorite: bool,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl Thought {
    /// Create a thought produced by the template generator
    pub fn from_template(content: &str, topic: String, mood: Mood) -> Self {
        Self {
            id: ThoughtId::new(),
            content: truncate_content(content),
            timestamp: Utc::now(),
            topic: Some(topic),
            mood,
            is_favorite: false,
            source: Source::Template,
            tokens_used: None,
            cost: None,
        }
    }

    /// Create a thought produced by the completion API
    pub fn from_completion(
        content: &str,
        topic: Option<String>,
        mood: Mood,
        tokens_used: Option<u32>,
        cost: Option<f64>,
    ) -> Self {
        Self {
            id: ThoughtId::new(),
            content: truncate_content(content),
            timestamp: Utc::now(),
            topic,
            mood,
            is_favorite: false,
            source: Source::Remote,
            tokens_used,
            cost,
        }
    }
}
