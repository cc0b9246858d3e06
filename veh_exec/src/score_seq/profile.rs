//! # Ejection profiles
//!
//! Each ejection variant is described by an [`EjectionProfile`]. The variants only differ in their
//! timings, feeder speeds and in which optional phases they use, so a single executor runs all of
//! them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use veh_if::eqpt::ProxThreshold;

use crate::conv_ctrl::{FeederSpeeds, ServoLaw};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Timings and speeds of one ejection variant.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EjectionProfile {
    /// Variant number selecting this profile
    pub variant: u8,

    /// Hard time limit of the sequence.
    ///
    /// Units: milliseconds
    pub timeout_ms: u64,

    /// Feeder speeds set at the start
    pub initial: FeederSpeeds,

    /// Forward wheel speed held during the sequence, if any
    #[serde(default)]
    pub creep_speed: Option<f64>,

    /// When the intake runs during the sequence
    #[serde(default)]
    pub intake: IntakeTiming,

    /// Gate sequence followed by the object through the conveyance
    #[serde(default)]
    pub gates: Option<GateSequence>,

    /// Continuous scoring started once the object clears the middle gate
    #[serde(default)]
    pub scoring: Option<ScoringWindow>,

    /// Hold the conveyance as soon as an object reaches the middle gate
    #[serde(default)]
    pub hold_on_detect: Option<HoldOnDetect>,
}

/// Intake timings, all relative to the start of the sequence.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct IntakeTiming {
    /// Turn the intake off when the sequence starts
    #[serde(default)]
    pub off_at_start: bool,

    /// Run the intake at full speed inside this window
    #[serde(default)]
    pub on_window: Option<IntakeWindow>,

    /// Turn the intake off after this time when outside the on window
    #[serde(default)]
    pub off_after_ms: Option<u64>,
}

/// An open time window, in milliseconds since the start of the sequence.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct IntakeWindow {
    pub from_ms: u64,

    #[serde(default)]
    pub until_ms: Option<u64>,
}

/// The phases of an object moving up through the conveyance.
///
/// Phase 1 sees the object at the middle gate, phase 2 sees it clear the middle gate and phase 3
/// sees it at the top gate. The middle stage latches when the next object arrives at the middle
/// gate after phase 2.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct GateSequence {
    /// Object detected at the middle gate
    pub middle_detect: ProxThreshold,

    /// Object cleared from the middle gate
    pub middle_clear: ProxThreshold,

    /// Phase 2 is only accepted after this time.
    ///
    /// Units: milliseconds
    pub clear_min_ms: u64,

    /// Object detected at the top gate
    pub top_detect: ProxThreshold,

    /// Middle stage speed set on reaching phase 2, unless already latched
    #[serde(default)]
    pub middle_speed_at_clear: Option<f64>,

    /// Middle stage speed set on reaching phase 3, unless already latched
    #[serde(default)]
    pub middle_speed_at_top: Option<f64>,

    /// Object at the middle gate which latches the middle stage
    pub latch_gate: ProxThreshold,

    /// The latch is only accepted after this time.
    ///
    /// Units: milliseconds
    pub latch_min_ms: u64,

    /// Offset from the current position of the latched target
    pub latch_offset: f64,

    /// Servo law of the latched middle stage
    pub latch_servo: ServoLaw,
}

/// Continuous scoring, timed from phase 2.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ScoringWindow {
    /// The latched middle stage is servoed only before this time.
    ///
    /// Units: milliseconds
    pub servo_ms: u64,

    /// Feeder speeds after the servo window
    pub eject: FeederSpeeds,

    /// Objects are only counted after this time.
    ///
    /// Units: milliseconds
    pub count_delay_ms: u64,

    /// Object at the middle gate which is counted
    pub count_gate: ProxThreshold,

    /// The sequence exits once this many objects have been counted
    pub early_exit_count: u32,

    /// Maximum settle time before the early exit.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,
}

/// Stop the conveyance as soon as the object reaches the middle gate.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct HoldOnDetect {
    /// Object at the middle gate
    pub gate: ProxThreshold,

    /// Detection is only accepted after this time
    #[serde(default)]
    pub min_ms: Option<u64>,

    /// Time to wait between holding the middle and the top stages
    #[serde(default)]
    pub settle_ms: Option<u64>,
}

/// Parameters of the scoring sequencer: the table of ejection profiles.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Params {
    pub profiles: Vec<EjectionProfile>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Get the profile of a variant.
    pub fn get_profile(&self, variant: u8) -> Option<&EjectionProfile> {
        self.profiles.iter().find(|p| p.variant == variant)
    }
}

impl Default for Params {
    fn default() -> Self {
        let latch_servo = ServoLaw::BangBang { speed: 127.0 };

        let gates = |middle_speed_at_clear, middle_speed_at_top, latch_min_ms, latch_offset| {
            GateSequence {
                middle_detect: ProxThreshold::above(1800.0),
                middle_clear: ProxThreshold::below(1650.0),
                clear_min_ms: 200,
                top_detect: ProxThreshold::above(180.0),
                middle_speed_at_clear,
                middle_speed_at_top,
                latch_gate: ProxThreshold::above(1650.0),
                latch_min_ms,
                latch_offset,
                latch_servo,
            }
        };

        Self {
            profiles: vec![
                EjectionProfile {
                    variant: 1,
                    timeout_ms: 760,
                    initial: FeederSpeeds { top: -127.0, middle: -96.0 },
                    creep_speed: Some(20.0),
                    intake: IntakeTiming {
                        off_after_ms: Some(600),
                        ..IntakeTiming::default()
                    },
                    gates: Some(gates(Some(-127.0 / 1.8), None, 150, 230.0)),
                    scoring: None,
                    hold_on_detect: None,
                },
                EjectionProfile {
                    variant: 2,
                    timeout_ms: 800,
                    initial: FeederSpeeds { top: -127.0, middle: -96.0 },
                    creep_speed: Some(30.0),
                    intake: IntakeTiming {
                        off_at_start: true,
                        on_window: Some(IntakeWindow {
                            from_ms: 180,
                            until_ms: Some(340),
                        }),
                        off_after_ms: Some(340),
                    },
                    gates: Some(gates(None, Some(-127.0 / 1.5), 100, 270.0)),
                    scoring: None,
                    hold_on_detect: None,
                },
                EjectionProfile {
                    variant: 3,
                    timeout_ms: 2200,
                    initial: FeederSpeeds { top: -127.0, middle: -127.0 },
                    creep_speed: None,
                    intake: IntakeTiming {
                        off_at_start: true,
                        on_window: Some(IntakeWindow {
                            from_ms: 50,
                            until_ms: None,
                        }),
                        off_after_ms: None,
                    },
                    gates: Some(gates(Some(-127.0 / 1.8), None, 300, 300.0)),
                    scoring: Some(ScoringWindow {
                        servo_ms: 500,
                        eject: FeederSpeeds { top: 127.0, middle: -127.0 },
                        count_delay_ms: 550,
                        count_gate: ProxThreshold::above(1700.0),
                        early_exit_count: 2,
                        settle_ms: 60,
                    }),
                    hold_on_detect: None,
                },
                EjectionProfile {
                    variant: 4,
                    timeout_ms: 600,
                    initial: FeederSpeeds { top: -127.0, middle: -96.0 },
                    creep_speed: Some(20.0),
                    intake: IntakeTiming::default(),
                    gates: None,
                    scoring: None,
                    hold_on_detect: Some(HoldOnDetect {
                        gate: ProxThreshold::above(1700.0),
                        min_ms: Some(150),
                        settle_ms: None,
                    }),
                },
                EjectionProfile {
                    variant: 5,
                    timeout_ms: 450,
                    initial: FeederSpeeds { top: -127.0, middle: -63.0 },
                    creep_speed: Some(20.0),
                    intake: IntakeTiming {
                        off_after_ms: Some(400),
                        ..IntakeTiming::default()
                    },
                    gates: None,
                    scoring: None,
                    hold_on_detect: Some(HoldOnDetect {
                        gate: ProxThreshold::above(1700.0),
                        min_ms: None,
                        settle_ms: Some(250),
                    }),
                },
            ],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/score_seq.toml")).unwrap();

        let defaults = Params::default();
        for variant in 1..=5 {
            assert_eq!(
                params.get_profile(variant),
                defaults.get_profile(variant),
                "variant {}",
                variant
            );
        }
        assert_eq!(params, defaults);
    }
}
