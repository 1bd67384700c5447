//! Post-session mood capture: one submission per selection, then navigation.

use super::{Mood, MoodClient, MoodEntry, MoodError, MoodReceipt};
use std::sync::Arc;
use std::time::Duration;

/// Pause after a logged mood before leaving the page.
pub const DEFAULT_RETURN_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq)]
pub enum PostSessionOutcome {
    ReturnHome { receipt: Option<MoodReceipt> },
    StartAgain,
}

pub struct PostSessionMood {
    client: Arc<dyn MoodClient>,
    user_id: String,
    note: Option<String>,
    return_delay: Duration,
    selected: Option<Mood>,
    logged: bool,
}

impl PostSessionMood {
    pub fn new(client: Arc<dyn MoodClient>, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            note: None,
            return_delay: DEFAULT_RETURN_DELAY,
            selected: None,
            logged: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_return_delay(mut self, delay: Duration) -> Self {
        self.return_delay = delay;
        self
    }

    pub fn selected(&self) -> Option<Mood> {
        self.selected
    }

    /// Submits the chosen mood. On failure the choice is cleared so the user
    /// can pick again; on success the flow ends with `ReturnHome`.
    pub async fn select(&mut self, mood: Mood) -> Result<PostSessionOutcome, MoodError> {
        if self.logged {
            return Err(MoodError::AlreadyFinished);
        }

        self.selected = Some(mood);

        let mut entry = MoodEntry::new(self.user_id.clone(), mood);
        if let Some(note) = self.note.as_deref() {
            entry = entry.with_text(note);
        }

        match self.client.submit(&entry).await {
            Ok(receipt) => {
                self.logged = true;
                tracing::info!(
                    "Post-session mood logged via {}: {}",
                    self.client.name(),
                    mood.label()
                );
                tokio::time::sleep(self.return_delay).await;
                Ok(PostSessionOutcome::ReturnHome {
                    receipt: Some(receipt),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to log post-session mood: {}", e);
                self.selected = None;
                Err(e)
            }
        }
    }

    pub fn start_again(self) -> PostSessionOutcome {
        PostSessionOutcome::StartAgain
    }

    pub fn return_home(self) -> PostSessionOutcome {
        PostSessionOutcome::ReturnHome { receipt: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct FakeClient {
        submitted: Mutex<Vec<MoodEntry>>,
        fail_first: Mutex<bool>,
    }

    impl FakeClient {
        fn new(fail_first: bool) -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
                fail_first: Mutex::new(fail_first),
            }
        }
    }

    #[async_trait]
    impl MoodClient for FakeClient {
        async fn submit(&self, entry: &MoodEntry) -> Result<MoodReceipt, MoodError> {
            self.submitted.lock().unwrap().push(entry.clone());

            let mut fail = self.fail_first.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(MoodError::Network("connection reset".to_string()));
            }

            Ok(MoodReceipt {
                id: "r-1".to_string(),
                user_id: entry.user_id.clone(),
                timestamp: None,
                emoji: entry.emoji.label().to_string(),
                emoji_score: entry.emoji.score(),
                text: entry.text.clone(),
                top_emotions: Vec::new(),
                text_polarity: 0.0,
                weighted_mood: entry.emoji.score(),
                z_score: 0.0,
                cusum: 0.0,
                mood_decline: false,
            })
        }

        async fn latest(&self, _user_id: &str) -> Result<Option<MoodReceipt>, MoodError> {
            Ok(None)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_submission_then_return_home() {
        let client = Arc::new(FakeClient::new(false));
        let mut flow = PostSessionMood::new(client.clone(), "user_breathing_session")
            .with_note("Post-breathing exercise mood");

        let started = Instant::now();
        let outcome = flow.select(Mood::Good).await.unwrap();
        assert_eq!(started.elapsed(), DEFAULT_RETURN_DELAY);

        match outcome {
            PostSessionOutcome::ReturnHome { receipt: Some(r) } => assert_eq!(r.emoji, "Good"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let submitted = client.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].user_id, "user_breathing_session");
        assert_eq!(submitted[0].emoji, Mood::Good);
        assert_eq!(
            submitted[0].text.as_deref(),
            Some("Post-breathing exercise mood")
        );
        assert!(submitted[0].timestamp.is_none());
        assert_eq!(
            serde_json::to_value(&submitted[0]).unwrap(),
            serde_json::json!({
                "user_id": "user_breathing_session",
                "emoji": "Good",
                "text": "Post-breathing exercise mood",
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_allows_another_choice() {
        let client = Arc::new(FakeClient::new(true));
        let mut flow = PostSessionMood::new(client.clone(), "u1");

        let err = flow.select(Mood::Stressed).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(flow.selected(), None);

        let outcome = flow.select(Mood::Okay).await.unwrap();
        assert!(matches!(outcome, PostSessionOutcome::ReturnHome { .. }));
        assert_eq!(flow.selected(), Some(Mood::Okay));
        assert_eq!(client.submitted.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_second_submission_after_success() {
        let client = Arc::new(FakeClient::new(false));
        let mut flow =
            PostSessionMood::new(client.clone(), "u1").with_return_delay(Duration::ZERO);

        flow.select(Mood::Amazing).await.unwrap();
        assert!(matches!(
            flow.select(Mood::Down).await,
            Err(MoodError::AlreadyFinished)
        ));
        assert_eq!(client.submitted.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_navigation_without_submitting() {
        let client = Arc::new(FakeClient::new(false));
        let flow = PostSessionMood::new(client.clone(), "u1");
        assert_eq!(flow.start_again(), PostSessionOutcome::StartAgain);

        let flow = PostSessionMood::new(client.clone(), "u1");
        assert_eq!(
            flow.return_home(),
            PostSessionOutcome::ReturnHome { receipt: None }
        );
        assert!(client.submitted.lock().unwrap().is_empty());
    }
}
