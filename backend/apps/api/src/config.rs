//! Server configuration from environment variables

use std::str::FromStr;

use anyhow::Context;
use platform::rate_limit::RateLimitConfig;
use thought::{ApiKey, RemoteSettings, ThoughtConfig};

const DEFAULT_PORT: u16 = 31113;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
/// Longest accepted remote window: one year
const MAX_REMOTE_WINDOW_HOURS: u64 = 365 * 24;

/// Everything `main` needs to start the server
#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// PostgreSQL URL; in-memory storage when unset
    pub database_url: Option<String>,
    pub frontend_origins: Vec<String>,
    pub thought: ThoughtConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let local_max = parse_or(&get, "LOCAL_MAX_REQUESTS_PER_MINUTE", 10u32)?;
        let remote_max = parse_or(&get, "REMOTE_MAX_REQUESTS", 50u32)?;
        let remote_hours = parse_or(&get, "REMOTE_WINDOW_HOURS", 24u64)?;
        anyhow::ensure!(
            (1..=MAX_REMOTE_WINDOW_HOURS).contains(&remote_hours),
            "REMOTE_WINDOW_HOURS must be between 1 and {MAX_REMOTE_WINDOW_HOURS}, got {remote_hours}"
        );

        let mut thought = ThoughtConfig {
            local_rate_limit: RateLimitConfig::new(local_max, 60),
            remote_rate_limit: RateLimitConfig::from_hours(remote_max, remote_hours),
            force_local: get("FORCE_LOCAL_TEMPLATES").is_some_and(|value| parse_flag(&value)),
            trust_forwarded_for: get("TRUST_FORWARDED_FOR").is_some_and(|value| parse_flag(&value)),
            remote: remote_settings(&get),
            ..ThoughtConfig::default()
        };
        if let Some(token) = get("CACHE_ADMIN_TOKEN") {
            thought = thought.with_admin_token(&token);
        }

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL"),
            frontend_origins,
            thought,
        })
    }
}

fn remote_settings(get: &impl Fn(&str) -> Option<String>) -> Option<RemoteSettings> {
    let raw_key = get("OPENAI_API_KEY")?;
    let Some(api_key) = ApiKey::parse(&raw_key) else {
        tracing::warn!("OPENAI_API_KEY is malformed, remote generation disabled");
        return None;
    };

    let mut settings = RemoteSettings::new(api_key);
    if let Some(model) = get("OPENAI_MODEL") {
        settings = settings.with_model(model);
    }
    if let Some(base_url) = get("OPENAI_BASE_URL") {
        settings = settings.with_base_url(base_url);
    }
    Some(settings)
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
