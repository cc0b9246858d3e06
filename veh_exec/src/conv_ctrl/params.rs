//! Conveyance control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use veh_if::eqpt::ProxThreshold;

use super::ServoLaw;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed demands for both feeder stages.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct FeederSpeeds {
    pub top: f64,
    pub middle: f64,
}

/// Parameters for conveyance control
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Params {

    // ---- SENSORS ----

    /// Object present at the top gate
    pub top_gate: ProxThreshold,

    /// Object present at the middle gate when a storing segment begins
    pub middle_gate_begin: ProxThreshold,

    /// Object present at the middle gate during a segment
    pub middle_gate: ProxThreshold,

    // ---- SEGMENT START ----

    /// Speeds when storing with the top gate empty
    pub store_fill: FeederSpeeds,

    /// Speeds when storing with the top gate full and the middle gate empty
    pub store_advance: FeederSpeeds,

    /// Speeds when ejecting at the normal rate
    pub eject_normal: FeederSpeeds,

    /// Speeds when ejecting at the fast rate
    pub eject_fast: FeederSpeeds,

    /// Speeds when ejecting at the extra fast rate
    pub eject_extra_fast: FeederSpeeds,

    // ---- DURING SEGMENT ----

    /// Offset from the current position at which the top stage latches
    pub top_lock_offset: f64,

    /// Offset from the current position at which the middle stage latches
    pub middle_lock_offset: f64,

    /// Servo law of the latched top stage
    pub top_servo: ServoLaw,

    /// Servo law of the latched middle stage
    pub middle_servo: ServoLaw,

    /// Minimum time between the top stage engaging and the middle stage advancing.
    ///
    /// Units: milliseconds
    pub middle_dwell_ms: u64,

    /// Speed of the middle stage while advancing towards its gate
    pub middle_advance_speed: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            top_gate: ProxThreshold::above(80.0),
            middle_gate_begin: ProxThreshold::above(1800.0),
            middle_gate: ProxThreshold::above(1700.0),
            store_fill: FeederSpeeds { top: -90.0, middle: -127.0 },
            store_advance: FeederSpeeds { top: 0.0, middle: -96.0 },
            eject_normal: FeederSpeeds { top: 78.0, middle: -79.2 },
            eject_fast: FeederSpeeds { top: 92.4, middle: -104.4 },
            eject_extra_fast: FeederSpeeds { top: 127.0, middle: -127.0 },
            top_lock_offset: -130.0,
            middle_lock_offset: 0.0,
            top_servo: ServoLaw::Proportional {
                gain: 60.0,
                err_divisor: 50.0,
                base_duty: 0.4,
            },
            middle_servo: ServoLaw::Proportional {
                gain: 40.0,
                err_divisor: 50.0,
                base_duty: 0.4,
            },
            middle_dwell_ms: 150,
            middle_advance_speed: -108.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/conv_ctrl.toml")).unwrap();

        assert_eq!(params, Params::default());
    }
}
