//! Mood capture after a breathing session.

mod http;
mod post_session;
mod types;

pub use http::HttpMoodClient;
pub use post_session::{PostSessionMood, PostSessionOutcome, DEFAULT_RETURN_DELAY};
pub use types::{EmotionItem, Mood, MoodEntry, MoodError, MoodReceipt};

use async_trait::async_trait;

/// Unified mood API trait
#[async_trait]
pub trait MoodClient: Send + Sync {
    /// Store one mood entry and return the analysed record
    async fn submit(&self, entry: &MoodEntry) -> Result<MoodReceipt, MoodError>;

    /// Most recent entry for a user, if any
    async fn latest(&self, user_id: &str) -> Result<Option<MoodReceipt>, MoodError>;

    /// Get client name
    fn name(&self) -> &str;
}
