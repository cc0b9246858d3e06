//! # Sensor fusion
//!
//! Combines the raw tracking wheel and heading readings into a single sample per tick.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use veh_if::eqpt::{EncId, Sensors};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fused sensor readings for one tick.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct FusedSample {
    /// Cumulative fore-aft travel, the average of the left and right wheels
    pub fwd_accum: f64,

    /// Cumulative lateral travel from the centre wheel
    pub lat_accum: f64,

    /// Heading in degrees, in [0, 360)
    pub heading_deg: f64,
}

/// Per tick motion in the vehicle body frame.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct MotionDelta {
    pub forward: f64,
    pub lateral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FusedSample {
    /// Read and fuse the sensors.
    pub fn read<S: Sensors + ?Sized>(sens: &S) -> Self {
        Self {
            fwd_accum: (sens.encoder(EncId::Left) + sens.encoder(EncId::Right)) / 2.0,
            lat_accum: sens.encoder(EncId::Centre),
            heading_deg: normalise_heading(sens.heading_deg()),
        }
    }

    /// Motion between a previous sample and this one.
    pub fn delta_from(&self, prev: &FusedSample) -> MotionDelta {
        MotionDelta {
            forward: self.fwd_accum - prev.fwd_accum,
            lateral: self.lat_accum - prev.lat_accum,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Bring a raw heading reading into [0, 360).
///
/// Negative readings have a single full turn added. Anything still outside the range after that,
/// including readings at or above 360, snaps to 0. This is not a modulo: 725 becomes 0, not 5.
pub fn normalise_heading(raw_deg: f64) -> f64 {
    let mut heading = raw_deg;

    if heading < 0.0 {
        heading += 360.0;
    }

    if heading >= 0.0 && heading < 360.0 {
        heading
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalise_heading() {
        assert_eq!(normalise_heading(-10.0), 350.0);
        assert_eq!(normalise_heading(725.0), 0.0);
        assert_eq!(normalise_heading(360.0), 0.0);
        assert_eq!(normalise_heading(0.0), 0.0);
        assert_eq!(normalise_heading(359.5), 359.5);
        assert_eq!(normalise_heading(-400.0), 0.0);
        assert_eq!(normalise_heading(f64::NAN), 0.0);

        let mut raw = -1000.0;
        while raw < 1000.0 {
            let h = normalise_heading(raw);
            assert!(h >= 0.0 && h < 360.0, "{} normalised to {}", raw, h);
            raw += 0.7;
        }
    }

    #[test]
    fn test_delta() {
        let prev = FusedSample {
            fwd_accum: 10.0,
            lat_accum: -2.0,
            heading_deg: 0.0,
        };
        let curr = FusedSample {
            fwd_accum: 15.0,
            lat_accum: 1.0,
            heading_deg: 0.0,
        };

        assert_eq!(
            curr.delta_from(&prev),
            MotionDelta {
                forward: 5.0,
                lateral: 3.0
            }
        );
    }
}
