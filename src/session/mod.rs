use crate::feedback::Feedback;
use uuid::Uuid;

pub mod phase;
pub mod progress;
pub mod settings;
pub mod visual;

pub use phase::Phase;
pub use progress::{
    DisplayInput, RoundIndicator, SessionEvent, SessionSnapshot, SessionStatus, SessionSummary,
};
pub use settings::{BreathingSettings, SettingsError, DURATION_OPTIONS, ROUND_OPTIONS};
pub use visual::CircleVisual;

/// Wall-clock period between two ticks.
pub const TICK_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session already completed; reset or start again first")]
    Completed,

    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("Session closed")]
    Closed,
}

/// What a single tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not running; nothing changed.
    Idle,
    Progressed,
    PhaseChanged { phase: Phase, round_advanced: bool },
    Completed,
}

/// Box-breathing state machine.
///
/// Progress is tracked as a whole number of ticks into the current phase so a
/// phase always ends after exactly `phase_duration_seconds * 10` ticks,
/// independent of floating point accumulation.
pub struct BreathingSession {
    session_id: String,
    settings: BreathingSettings,
    is_active: bool,
    is_completed: bool,
    current_phase: Phase,
    phase_ticks: u32,
    current_round: u32,
    elapsed_ticks: u64,
    feedback: Feedback,
}

impl BreathingSession {
    pub fn new(settings: BreathingSettings, feedback: Feedback) -> Result<Self, SessionError> {
        settings.validate()?;

        let session = Self {
            session_id: Uuid::new_v4().to_string(),
            settings,
            is_active: false,
            is_completed: false,
            current_phase: Phase::Inhale,
            phase_ticks: 0,
            current_round: 1,
            elapsed_ticks: 0,
            feedback,
        };

        tracing::info!(
            "Created breathing session {} ({}s x {} rounds)",
            session.session_id,
            settings.phase_duration_seconds,
            settings.total_rounds
        );
        Ok(session)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn settings(&self) -> &BreathingSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn progress_percent(&self) -> f64 {
        self.phase_ticks as f64 * self.settings.progress_increment()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_completed {
            SessionStatus::Completed
        } else if self.is_active {
            SessionStatus::Running
        } else {
            SessionStatus::Idle
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            status: self.status(),
            phase: self.current_phase,
            progress_percent: self.progress_percent(),
            phase_duration_seconds: self.settings.phase_duration_seconds,
            current_round: self.current_round,
            total_rounds: self.settings.total_rounds,
            sound_enabled: self.settings.sound_enabled,
            haptic_enabled: self.settings.haptic_enabled,
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_completed {
            return Err(SessionError::Completed);
        }
        if !self.is_active {
            self.is_active = true;
            tracing::info!(
                "Session {} running: {} round {}/{}",
                self.session_id,
                self.current_phase,
                self.current_round,
                self.settings.total_rounds
            );
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.is_active {
            self.is_active = false;
            tracing::info!(
                "Session {} paused at {} ({:.1}%)",
                self.session_id,
                self.current_phase,
                self.progress_percent()
            );
        }
    }

    pub fn toggle(&mut self) -> Result<(), SessionError> {
        if self.is_active {
            self.pause();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4().to_string();
        self.is_active = false;
        self.is_completed = false;
        self.current_phase = Phase::Inhale;
        self.phase_ticks = 0;
        self.current_round = 1;
        self.elapsed_ticks = 0;

        tracing::info!("Session reset: {}", self.session_id);
    }

    /// Replaces the settings and resets. Invalid settings leave the session untouched.
    pub fn apply_settings(&mut self, settings: BreathingSettings) -> Result<(), SessionError> {
        if let Err(e) = settings.validate() {
            tracing::warn!("Rejected settings {:?}: {}", settings, e);
            return Err(e.into());
        }

        self.settings = settings;
        tracing::info!(
            "Settings applied: {}s per phase, {} rounds, sound={}, haptic={}",
            settings.phase_duration_seconds,
            settings.total_rounds,
            settings.sound_enabled,
            settings.haptic_enabled
        );
        self.reset();
        Ok(())
    }

    pub fn start_again(&mut self) {
        self.is_completed = false;
        self.reset();
    }

    /// Summary for the navigation away from the page. Stops the session.
    pub fn complete_session(&mut self) -> SessionSummary {
        self.is_active = false;

        let rounds_completed = if self.is_completed {
            self.settings.total_rounds
        } else {
            self.current_round - 1
        };

        let summary = SessionSummary {
            session_id: self.session_id.clone(),
            completed: self.is_completed,
            rounds_completed,
            total_rounds: self.settings.total_rounds,
            breathing_secs: self.elapsed_ticks as f32 * TICK_INTERVAL_MS as f32 / 1000.0,
        };

        tracing::info!(
            "Session {} closed: completed={}, rounds={}/{}, {:.1}s breathed",
            summary.session_id,
            summary.completed,
            summary.rounds_completed,
            summary.total_rounds,
            summary.breathing_secs
        );
        summary
    }

    /// Advances the session by one 100ms tick.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active || self.is_completed {
            return TickOutcome::Idle;
        }

        self.elapsed_ticks += 1;
        self.phase_ticks += 1;

        if self.phase_ticks < self.settings.ticks_per_phase() {
            return TickOutcome::Progressed;
        }

        let (next_phase, wrapped) = self.current_phase.next();

        if self.settings.haptic_enabled {
            self.feedback.haptic_pulse();
        }

        let mut round_advanced = false;
        if wrapped {
            if self.current_round >= self.settings.total_rounds {
                self.is_completed = true;
                self.is_active = false;
                self.phase_ticks = 0;

                tracing::info!(
                    "Session {} completed after {} rounds",
                    self.session_id,
                    self.settings.total_rounds
                );
                return TickOutcome::Completed;
            }

            self.current_round += 1;
            round_advanced = true;
        }

        if self.settings.sound_enabled {
            self.feedback.sound_cue(next_phase);
        }

        self.current_phase = next_phase;
        self.phase_ticks = 0;

        tracing::debug!(
            "Session {}: {} (round {})",
            self.session_id,
            next_phase,
            self.current_round
        );

        TickOutcome::PhaseChanged {
            phase: next_phase,
            round_advanced,
        }
    }
}
