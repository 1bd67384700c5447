use super::{BreathingSettings, Phase};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
}

/// Everything a presentation layer needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub phase: Phase,
    pub progress_percent: f64,
    pub phase_duration_seconds: u32,
    pub current_round: u32,
    pub total_rounds: u32,
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInput {
    pub phase: Phase,
    pub progress_percent: f64,
    pub phase_duration_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundIndicator {
    pub current_round: u32,
    pub total_rounds: u32,
}

impl SessionSnapshot {
    pub fn display(&self) -> DisplayInput {
        DisplayInput {
            phase: self.phase,
            progress_percent: self.progress_percent,
            phase_duration_seconds: self.phase_duration_seconds,
        }
    }

    pub fn rounds(&self) -> RoundIndicator {
        RoundIndicator {
            current_round: self.current_round,
            total_rounds: self.total_rounds,
        }
    }

    pub fn settings(&self) -> BreathingSettings {
        BreathingSettings {
            phase_duration_seconds: self.phase_duration_seconds,
            total_rounds: self.total_rounds,
            sound_enabled: self.sound_enabled,
            haptic_enabled: self.haptic_enabled,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Notifications pushed to observers alongside snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    Started,
    Paused,
    PhaseChanged { phase: Phase, round: u32 },
    RoundAdvanced { round: u32 },
    Completed { rounds: u32 },
    Reset,
    SettingsApplied { settings: BreathingSettings },
    Closed { summary: SessionSummary },
}

/// Outcome reported when the session leaves the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub completed: bool,
    pub rounds_completed: u32,
    pub total_rounds: u32,
    pub breathing_secs: f32,
}
