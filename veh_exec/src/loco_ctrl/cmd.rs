//! Commands passed into LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use veh_if::eqpt::BrakeMode;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible manouvres to be executed by LocoCtrl.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub enum MnvrCmd {
    /// Holonomic - independent translation and rotation in the body frame.
    ///
    /// All values are in actuator speed units. Positive `fwd` drives forwards, positive `lat`
    /// drives to the right and positive `turn` increases the heading.
    Holonomic { fwd: f64, lat: f64, turn: f64 },

    /// Stop - bring every wheel to zero speed with the given brake mode.
    Stop(BrakeMode),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MnvrCmd {
    /// Determine if the command is valid (i.e. contains only finite demands).
    pub fn is_valid(&self) -> bool {
        match self {
            MnvrCmd::Holonomic { fwd, lat, turn } => {
                fwd.is_finite() && lat.is_finite() && turn.is_finite()
            }
            MnvrCmd::Stop(_) => true,
        }
    }
}
