//! Haptic and sound hooks fired on phase transitions.
//!
//! Both are best effort: a failing or missing device never affects the session.

use crate::session::Phase;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Length of the pulse issued at every phase change.
pub const PHASE_PULSE: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Feedback device unavailable")]
    Unavailable,

    #[error("Feedback device error: {0}")]
    Device(String),
}

/// Vibration capability. Implementations must return promptly.
pub trait HapticFeedback: Send + Sync {
    fn pulse(&self, duration: Duration) -> Result<(), FeedbackError>;

    fn name(&self) -> &str;
}

/// Audible cue for the phase being entered.
pub trait SoundCue: Send + Sync {
    fn play(&self, phase: Phase) -> Result<(), FeedbackError>;

    fn name(&self) -> &str;
}

/// Platforms without a vibration motor.
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn pulse(&self, _duration: Duration) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unavailable)
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl SoundCue for TerminalBell {
    fn play(&self, _phase: Phase) -> Result<(), FeedbackError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| FeedbackError::Device(e.to_string()))
    }

    fn name(&self) -> &str {
        "terminal-bell"
    }
}

#[derive(Clone)]
pub struct Feedback {
    haptics: Option<Arc<dyn HapticFeedback>>,
    sound: Option<Arc<dyn SoundCue>>,
}

impl Feedback {
    pub fn none() -> Self {
        Self {
            haptics: None,
            sound: None,
        }
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn HapticFeedback>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    pub fn with_sound(mut self, sound: Arc<dyn SoundCue>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub(crate) fn haptic_pulse(&self) {
        let Some(haptics) = self.haptics.as_ref() else {
            return;
        };

        if let Err(e) = haptics.pulse(PHASE_PULSE) {
            tracing::debug!("Haptic pulse via {} ignored: {}", haptics.name(), e);
        }
    }

    pub(crate) fn sound_cue(&self, phase: Phase) {
        let Some(sound) = self.sound.as_ref() else {
            return;
        };

        if let Err(e) = sound.play(phase) {
            tracing::debug!("Sound cue via {} ignored: {}", sound.name(), e);
        }
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::none()
    }
}
