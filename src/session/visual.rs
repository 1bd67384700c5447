use super::{DisplayInput, Phase, SessionSnapshot};
use serde::Serialize;
use std::f64::consts::PI;

pub const RING_RADIUS: f64 = 140.0;
const MIN_SCALE: f64 = 1.0;
const MAX_SCALE: f64 = 1.4;

/// Geometry of the breathing circle for a given frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleVisual {
    pub instruction: &'static str,
    pub scale: f64,
    pub opacity: f64,
    pub ring_circumference: f64,
    pub ring_offset: f64,
    pub pulsing: bool,
    pub transition_secs: u32,
}

impl CircleVisual {
    pub fn compute(phase: Phase, progress_percent: f64, phase_duration_seconds: u32) -> Self {
        let p = (progress_percent / 100.0).clamp(0.0, 1.0);
        let span = MAX_SCALE - MIN_SCALE;

        let (scale, opacity) = match phase {
            Phase::Inhale => (MIN_SCALE + span * p, 0.6 + 0.4 * p),
            Phase::Exhale => (MAX_SCALE - span * p, 1.0 - 0.4 * p),
            Phase::HoldTop => (MAX_SCALE, 1.0),
            Phase::HoldBottom => (MIN_SCALE, 1.0),
        };

        let circumference = 2.0 * PI * RING_RADIUS;

        Self {
            instruction: phase.instruction(),
            scale,
            opacity,
            ring_circumference: circumference,
            ring_offset: circumference - p * circumference,
            pulsing: phase.is_hold(),
            transition_secs: phase_duration_seconds,
        }
    }

    pub fn from_display(input: DisplayInput) -> Self {
        Self::compute(
            input.phase,
            input.progress_percent,
            input.phase_duration_seconds,
        )
    }

    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self::from_display(snapshot.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_inhale_expands() {
        let start = CircleVisual::compute(Phase::Inhale, 0.0, 4);
        let half = CircleVisual::compute(Phase::Inhale, 50.0, 4);
        assert!(close(start.scale, 1.0));
        assert!(close(start.opacity, 0.6));
        assert!(close(half.scale, 1.2));
        assert!(close(half.opacity, 0.8));
        assert_eq!(half.instruction, "Breathe In");
        assert!(!half.pulsing);
    }

    #[test]
    fn test_exhale_contracts() {
        let visual = CircleVisual::compute(Phase::Exhale, 75.0, 5);
        assert!(close(visual.scale, 1.4 - 0.3));
        assert!(close(visual.opacity, 0.7));
        assert_eq!(visual.transition_secs, 5);
    }

    #[test]
    fn test_holds_are_static_and_pulse() {
        let top = CircleVisual::compute(Phase::HoldTop, 30.0, 4);
        let bottom = CircleVisual::compute(Phase::HoldBottom, 90.0, 4);
        assert!(close(top.scale, 1.4));
        assert!(close(bottom.scale, 1.0));
        assert!(close(top.opacity, 1.0));
        assert!(top.pulsing && bottom.pulsing);
    }

    #[test]
    fn test_ring_offset() {
        let empty = CircleVisual::compute(Phase::Inhale, 0.0, 4);
        let quarter = CircleVisual::compute(Phase::Inhale, 25.0, 4);
        assert!(close(empty.ring_offset, empty.ring_circumference));
        assert!(close(quarter.ring_offset, quarter.ring_circumference * 0.75));
    }

    #[test]
    fn test_from_display_matches_compute() {
        let input = DisplayInput {
            phase: Phase::Exhale,
            progress_percent: 40.0,
            phase_duration_seconds: 6,
        };
        assert_eq!(
            CircleVisual::from_display(input),
            CircleVisual::compute(Phase::Exhale, 40.0, 6)
        );
    }
}
