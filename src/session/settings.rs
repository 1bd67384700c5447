use serde::{Deserialize, Serialize};

pub const DURATION_OPTIONS: [u32; 4] = [3, 4, 5, 6];
pub const ROUND_OPTIONS: [u32; 4] = [3, 5, 10, 20];

pub const DEFAULT_PHASE_DURATION_SECS: u32 = 4;
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

/// Per-session configuration. Only replaced between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreathingSettings {
    pub phase_duration_seconds: u32,
    pub total_rounds: u32,
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
}

impl Default for BreathingSettings {
    fn default() -> Self {
        Self {
            phase_duration_seconds: DEFAULT_PHASE_DURATION_SECS,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            sound_enabled: false,
            haptic_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Unsupported phase duration: {0}s (expected one of 3, 4, 5, 6)")]
    UnsupportedDuration(u32),

    #[error("Unsupported round count: {0} (expected one of 3, 5, 10, 20)")]
    UnsupportedRounds(u32),
}

impl BreathingSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !DURATION_OPTIONS.contains(&self.phase_duration_seconds) {
            return Err(SettingsError::UnsupportedDuration(
                self.phase_duration_seconds,
            ));
        }

        if !ROUND_OPTIONS.contains(&self.total_rounds) {
            return Err(SettingsError::UnsupportedRounds(self.total_rounds));
        }

        Ok(())
    }

    /// Copy with every numeric field snapped to the nearest supported option.
    pub fn normalized(&self) -> Self {
        Self {
            phase_duration_seconds: nearest_option(&DURATION_OPTIONS, self.phase_duration_seconds),
            total_rounds: nearest_option(&ROUND_OPTIONS, self.total_rounds),
            ..*self
        }
    }

    /// Ticks of 100ms needed to finish one phase.
    pub fn ticks_per_phase(&self) -> u32 {
        self.phase_duration_seconds * 10
    }

    /// Progress percentage gained per tick.
    pub fn progress_increment(&self) -> f64 {
        100.0 / self.ticks_per_phase() as f64
    }
}

// Ties go to the smaller option since options are scanned in ascending order.
fn nearest_option(options: &[u32], value: u32) -> u32 {
    let mut best = options[0];
    for &option in options {
        if option.abs_diff(value) < best.abs_diff(value) {
            best = option;
        }
    }
    best
}
