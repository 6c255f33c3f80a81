//! Domain Value Objects
//!
//! Immutable value types for the thought domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tone of a generated thought
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Philosophical,
    Humorous,
    Scientific,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Philosophical, Mood::Humorous, Mood::Scientific];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Philosophical => "philosophical",
            Mood::Humorous => "humorous",
            Mood::Scientific => "scientific",
        }
    }

    /// Parse a mood from untrusted input, falling back to the default mood
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mood: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "philosophical" => Ok(Mood::Philosophical),
            "humorous" => Ok(Mood::Humorous),
            "scientific" => Ok(Mood::Scientific),
            _ => Err(UnknownMood(s.to_string())),
        }
    }
}

/// Which generator produced a thought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Template,
    Remote,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Template => "template",
            Source::Remote => "remote",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential for the completion API
///
/// Only keys of the expected shape are accepted; anything else leaves
/// remote generation disabled.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub const PREFIX: &'static str = "sk-";
    pub const MIN_LEN: usize = 20;

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let well_formed = raw.starts_with(Self::PREFIX)
            && raw.len() >= Self::MIN_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_is_case_insensitive() {
        assert_eq!("Humorous".parse::<Mood>().unwrap(), Mood::Humorous);
        assert_eq!(" scientific ".parse::<Mood>().unwrap(), Mood::Scientific);
        assert!("grumpy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_parse_lossy_defaults_to_philosophical() {
        assert_eq!(Mood::parse_lossy(None), Mood::Philosophical);
        assert_eq!(Mood::parse_lossy(Some("grumpy")), Mood::Philosophical);
        assert_eq!(Mood::parse_lossy(Some("humorous")), Mood::Humorous);
    }

    #[test]
    fn test_mood_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Scientific).unwrap(), "\"scientific\"");
        assert_eq!(serde_json::to_string(&Source::Template).unwrap(), "\"template\"");
    }

    #[test]
    fn test_api_key_shape() {
        assert!(ApiKey::parse("sk-abcdefghijklmnopqrstuvwxyz").is_some());
        assert!(ApiKey::parse("sk-proj_ABC-123-def-456").is_some());
        assert!(ApiKey::parse("sk-short").is_none());
        assert!(ApiKey::parse("pk-abcdefghijklmnopqrstuvwxyz").is_none());
        assert!(ApiKey::parse("sk-abcdefghij klmnopqrstuvwxyz").is_none());
        assert!(ApiKey::parse("").is_none());
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::parse("sk-abcdefghijklmnopqrstuvwxyz").unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("abcdef"));
        assert!(debug.contains("REDACTED"));
    }
}
