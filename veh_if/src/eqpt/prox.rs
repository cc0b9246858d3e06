//! # Proximity thresholds
//!
//! Proximity sensors on the vehicle don't agree on which way their reading moves when an object
//! is in front of them, so each calibrated threshold carries its own polarity.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A calibrated detection threshold for one proximity sensor.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ProxThreshold {
    /// The raw sensor level at which the reading flips.
    pub level: f64,

    /// Which side of `level` means an object is present.
    pub polarity: Polarity,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Polarity {
    /// Object present when the reading is strictly above the level
    Above,
    /// Object present when the reading is strictly below the level
    Below,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ProxThreshold {
    pub const fn above(level: f64) -> Self {
        Self {
            level,
            polarity: Polarity::Above,
        }
    }

    pub const fn below(level: f64) -> Self {
        Self {
            level,
            polarity: Polarity::Below,
        }
    }

    /// Returns true if the reading means an object is present.
    pub fn is_present(&self, value: f64) -> bool {
        match self.polarity {
            Polarity::Above => value > self.level,
            Polarity::Below => value < self.level,
        }
    }

    /// Returns true if the reading means the gate is clear.
    ///
    /// This is strict on the opposite side, so a reading exactly at the level is neither present
    /// nor clear.
    pub fn is_clear(&self, value: f64) -> bool {
        match self.polarity {
            Polarity::Above => value < self.level,
            Polarity::Below => value > self.level,
        }
    }
}
