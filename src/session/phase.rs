use serde::{Deserialize, Serialize};

/// One step of the box-breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Inhale,
    HoldTop,
    Exhale,
    HoldBottom,
}

impl Phase {
    /// Cycle order. A round is one pass through this array.
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::HoldTop, Phase::Exhale, Phase::HoldBottom];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::HoldTop => 1,
            Phase::Exhale => 2,
            Phase::HoldBottom => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Returns the following phase and whether the cycle wrapped back to inhale.
    pub fn next(self) -> (Phase, bool) {
        let next_index = (self.index() + 1) % Self::ALL.len();
        (Self::from_index(next_index), next_index == 0)
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In",
            Phase::HoldTop | Phase::HoldBottom => "Hold",
            Phase::Exhale => "Breathe Out",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::HoldTop => "hold-top",
            Phase::Exhale => "exhale",
            Phase::HoldBottom => "hold-bottom",
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Phase::HoldTop | Phase::HoldBottom)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
