//! # Position hold servo laws

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A law driving a stage towards a latched position.
///
/// Neither law has a deadband, the stage always moves towards the side of the target it isn't on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ServoLaw {
    /// Speed of `gain * (|error| / err_divisor + base_duty)`
    Proportional {
        gain: f64,
        err_divisor: f64,
        base_duty: f64,
    },

    /// Constant speed
    BangBang { speed: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ServoLaw {
    /// Speed demand to move from `position` towards `target`.
    pub fn demand(&self, position: f64, target: f64) -> f64 {
        let magnitude = match *self {
            ServoLaw::Proportional {
                gain,
                err_divisor,
                base_duty,
            } => gain * ((position - target).abs() / err_divisor + base_duty),
            ServoLaw::BangBang { speed } => speed,
        };

        if position < target {
            magnitude
        } else {
            -magnitude
        }
    }
}
