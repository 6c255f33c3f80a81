//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::quota::{QuotaOutput, WindowQuota};
use crate::domain::entities::Thought;
use crate::domain::value_objects::{Mood, Source};

/// Request for POST /api/thoughts/generate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<String>,
    /// Unknown moods fall back to philosophical
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub use_remote: bool,
}

/// A thought as returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtResponse {
    pub id: String,
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

impl From<Thought> for ThoughtResponse {
    fn from(thought: Thought) -> Self {
        Self {
            id: thought.id.to_string(),
            content: thought.content,
            timestamp: thought.timestamp,
            topic: thought.topic,
            mood: thought.mood,
            is_favorite: thought.is_favorite,
            source: thought.source,
            tokens_used: thought.tokens_used,
            cost: thought.cost,
        }
    }
}

/// Query for GET /api/thoughts/daily
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyQuery {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// One rate window in GET /api/thoughts/quota
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResponse {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl From<WindowQuota> for WindowResponse {
    fn from(quota: WindowQuota) -> Self {
        Self {
            limit: quota.limit,
            remaining: quota.remaining,
            reset_at_ms: quota.reset_at_ms,
        }
    }
}

/// Response for GET /api/thoughts/quota
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResponse {
    pub local: WindowResponse,
    pub remote: Option<WindowResponse>,
    pub remote_enabled: bool,
}

impl From<QuotaOutput> for QuotaResponse {
    fn from(output: QuotaOutput) -> Self {
        Self {
            local: output.local.into(),
            remote_enabled: output.remote.is_some(),
            remote: output.remote.map(Into::into),
        }
    }
}

/// Query for DELETE /api/thoughts/cache
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Response for DELETE /api/thoughts/cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}
