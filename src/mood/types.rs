//! Mood vocabulary and the wire types of the external mood-logging API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Mood choices offered after a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Amazing,
    Good,
    Okay,
    Down,
    Stressed,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Amazing, Mood::Good, Mood::Okay, Mood::Down, Mood::Stressed];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Amazing => "Amazing",
            Mood::Good => "Good",
            Mood::Okay => "Okay",
            Mood::Down => "Down",
            Mood::Stressed => "Stressed",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Amazing => "😄",
            Mood::Good => "😊",
            Mood::Okay => "😐",
            Mood::Down => "😔",
            Mood::Stressed => "😫",
        }
    }

    /// Score the backend assigns to the emoji, from -1.0 to 1.0.
    pub fn score(self) -> f32 {
        match self {
            Mood::Amazing => 1.0,
            Mood::Good => 0.5,
            Mood::Okay => 0.0,
            Mood::Down => -0.5,
            Mood::Stressed => -1.0,
        }
    }
}

impl FromStr for Mood {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MoodError::UnknownMood(wanted.to_string()))
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji(), self.label())
    }
}

/// Body of `POST /mood/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub user_id: String,
    pub emoji: Mood,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Unset unless importing past entries; the API stamps new ones itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MoodEntry {
    pub fn new(user_id: impl Into<String>, emoji: Mood) -> Self {
        Self {
            user_id: user_id.into(),
            emoji,
            text: None,
            timestamp: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionItem {
    pub label: String,
    pub score: f32,
}

/// Stored entry echoed back by the API, including its sentiment analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReceipt {
    pub id: String,
    pub user_id: String,
    /// Kept verbatim; the API may omit the UTC offset.
    #[serde(default)]
    pub timestamp: Option<String>,
    pub emoji: String,
    #[serde(default)]
    pub emoji_score: f32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub top_emotions: Vec<EmotionItem>,
    #[serde(default)]
    pub text_polarity: f32,
    #[serde(default)]
    pub weighted_mood: f32,
    #[serde(default)]
    pub z_score: f32,
    #[serde(default)]
    pub cusum: f32,
    #[serde(default)]
    pub mood_decline: bool,
}

/// Mood API errors with retry classification
#[derive(Debug, Error)]
pub enum MoodError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed")]
    Authentication,

    #[error("Entry rejected: {0}")]
    Rejected(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown mood: {0}")]
    UnknownMood(String),

    #[error("Mood already logged for this session")]
    AlreadyFinished,
}

impl MoodError {
    /// True if trying the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MoodError::Network(_) | MoodError::Timeout => true,
            MoodError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
