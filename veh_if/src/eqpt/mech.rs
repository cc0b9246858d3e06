//! # Mechanisms Demands
//!
//! Demands on the vehicle's actuators are collected into a [`MechDems`] during a control tick and
//! written to the equipment in one go at the end of the tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ActId, Actuators, BrakeMode};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands produced during one control tick.
///
/// A channel carries at most one of a speed or a voltage demand. Whichever was written last in the
/// tick wins.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MechDems {
    /// Brake modes to apply before any speed or voltage
    pub brake: BTreeMap<ActId, BrakeMode>,

    /// Signed speed demands
    pub speed: BTreeMap<ActId, f64>,

    /// Raw voltage demands
    pub voltage: BTreeMap<ActId, f64>,
}

/// Output limits of the actuators.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ActLimits {
    /// Maximum absolute speed demand
    pub max_abs_speed: f64,

    /// Maximum absolute voltage demand
    pub max_abs_voltage: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ActLimits {
    fn default() -> Self {
        Self {
            max_abs_speed: 127.0,
            max_abs_voltage: 12000.0,
        }
    }
}

impl MechDems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no demands have been made this tick.
    pub fn is_empty(&self) -> bool {
        self.brake.is_empty() && self.speed.is_empty() && self.voltage.is_empty()
    }

    pub fn set_speed(&mut self, id: ActId, speed: f64) {
        self.voltage.remove(&id);
        self.speed.insert(id, speed);
    }

    pub fn set_voltage(&mut self, id: ActId, voltage: f64) {
        self.speed.remove(&id);
        self.voltage.insert(id, voltage);
    }

    pub fn set_brake_mode(&mut self, id: ActId, mode: BrakeMode) {
        self.brake.insert(id, mode);
    }

    /// Set the brake mode and then a zero speed on every given channel.
    pub fn stop(&mut self, ids: &[ActId], mode: BrakeMode) {
        for id in ids {
            self.set_brake_mode(*id, mode);
            self.set_speed(*id, 0.0);
        }
    }

    /// Merge another set of demands into this one, the other set taking priority.
    pub fn merge(&mut self, other: MechDems) {
        for (id, mode) in other.brake {
            self.set_brake_mode(id, mode);
        }
        for (id, speed) in other.speed {
            self.set_speed(id, speed);
        }
        for (id, voltage) in other.voltage {
            self.set_voltage(id, voltage);
        }
    }

    /// Write the demands to the actuators.
    ///
    /// Brake modes are written first, then speeds and voltages clamped to the limits. The demands
    /// are consumed.
    pub fn apply<A: Actuators + ?Sized>(self, act: &mut A, limits: &ActLimits) {
        for (id, mode) in self.brake {
            act.set_brake_mode(id, mode);
        }
        for (id, speed) in self.speed {
            act.set_speed(id, limits.clamp_speed(speed));
        }
        for (id, voltage) in self.voltage {
            act.set_voltage(id, limits.clamp_voltage(voltage));
        }
    }
}

impl ActLimits {
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        clamp_abs(speed, self.max_abs_speed)
    }

    pub fn clamp_voltage(&self, voltage: f64) -> f64 {
        clamp_abs(voltage, self.max_abs_voltage)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn clamp_abs(value: f64, max_abs: f64) -> f64 {
    if value > max_abs {
        max_abs
    } else if value < -max_abs {
        -max_abs
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut dems = MechDems::new();

        dems.set_speed(ActId::FeedTop, 50.0);
        dems.set_voltage(ActId::FeedTop, 0.0);
        assert!(dems.speed.get(&ActId::FeedTop).is_none());
        assert_eq!(dems.voltage.get(&ActId::FeedTop), Some(&0.0));

        dems.set_speed(ActId::FeedTop, -20.0);
        assert!(dems.voltage.get(&ActId::FeedTop).is_none());
        assert_eq!(dems.speed.get(&ActId::FeedTop), Some(&-20.0));
    }

    #[test]
    fn test_merge() {
        let mut first = MechDems::new();
        first.set_speed(ActId::DrvFL, 10.0);
        first.set_speed(ActId::FeedMiddle, 10.0);

        let mut second = MechDems::new();
        second.set_voltage(ActId::FeedMiddle, 0.0);

        first.merge(second);
        assert_eq!(first.speed.get(&ActId::DrvFL), Some(&10.0));
        assert!(first.speed.get(&ActId::FeedMiddle).is_none());
        assert_eq!(first.voltage.get(&ActId::FeedMiddle), Some(&0.0));
    }

    #[test]
    fn test_limits() {
        let limits = ActLimits::default();
        assert_eq!(limits.clamp_speed(200.0), 127.0);
        assert_eq!(limits.clamp_speed(-200.0), -127.0);
        assert_eq!(limits.clamp_speed(42.0), 42.0);
        assert_eq!(limits.clamp_voltage(-15000.0), -12000.0);
    }
}
