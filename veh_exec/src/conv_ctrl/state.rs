//! Conveyance engagement state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Engagement of both conveyance stages.
///
/// Persists between drive segments since an object can be mid-transfer when one segment ends and
/// the next begins. Cleared at the end of every scoring sequence.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Engagement {
    pub top: StageLatch,
    pub middle: StageLatch,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Whether a stage has locked onto an object.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum StageLatch {
    /// The stage is free running or idle
    Free,

    /// The stage is holding its latched target position
    Engaged { since_ms: u64, target_pos: f64 },
}

/// Observable state of one conveyance stage.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum StageState {
    /// Nothing commanded
    Idle,

    /// Moving an object towards the stage's gate
    Advancing,

    /// Locked onto an object this tick
    PositionLocked,

    /// Servoing on the latched position
    Holding,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StageLatch {
    fn default() -> Self {
        StageLatch::Free
    }
}

impl Default for StageState {
    fn default() -> Self {
        StageState::Idle
    }
}

impl StageLatch {
    pub fn is_engaged(&self) -> bool {
        matches!(self, StageLatch::Engaged { .. })
    }

    /// Latched target position if engaged.
    pub fn target(&self) -> Option<f64> {
        match self {
            StageLatch::Engaged { target_pos, .. } => Some(*target_pos),
            StageLatch::Free => None,
        }
    }

    /// Time since the stage was engaged, or `None` if it is free.
    pub fn engaged_for_ms(&self, now_ms: u64) -> Option<u64> {
        match self {
            StageLatch::Engaged { since_ms, .. } => Some(now_ms.saturating_sub(*since_ms)),
            StageLatch::Free => None,
        }
    }
}

impl Engagement {
    /// Disengage both stages.
    pub fn reset(&mut self) {
        self.top = StageLatch::Free;
        self.middle = StageLatch::Free;
    }

    pub fn any_engaged(&self) -> bool {
        self.top.is_engaged() || self.middle.is_engaged()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_latch() {
        let mut eng = Engagement::default();
        assert!(!eng.any_engaged());
        assert_eq!(eng.top.engaged_for_ms(100), None);

        eng.top = StageLatch::Engaged {
            since_ms: 40,
            target_pos: -130.0,
        };
        assert!(eng.any_engaged());
        assert_eq!(eng.top.target(), Some(-130.0));
        assert_eq!(eng.top.engaged_for_ms(100), Some(60));

        eng.reset();
        assert_eq!(eng, Engagement::default());
    }
}
