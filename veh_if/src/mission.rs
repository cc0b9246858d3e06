//! # Mission commands
//!
//! A mission is a sequence of [`MissionCmd`]s executed one after the other by the vehicle. Each
//! command is blocking: the next one starts only once the previous one has run to completion.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eqpt::BrakeMode;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose to drive to together with how to get there.
///
/// Any field missing from a serialised goal takes the value from [`Goal::default`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Goal {
    /// Target position along the field x axis
    pub x: f64,

    /// Target position along the field y axis
    pub y: f64,

    /// Target heading in degrees
    pub heading_deg: f64,

    /// Translation speed bound, in actuator speed units
    pub move_speed: f64,

    /// Turn speed bound, in actuator speed units
    pub turn_speed: f64,

    /// Distance below which the position is considered reached
    pub position_tolerance: f64,

    /// Half width of the heading band, in degrees
    pub angle_tolerance: f64,

    /// Advance objects into the conveyance during the segment
    pub store: bool,

    /// Eject objects from the top of the conveyance at the given rate
    pub eject: Option<EjectRate>,

    /// Stop early if the contact sensor reports an object
    pub stop_on_contact: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Rate at which objects are pushed out of the top of the conveyance while driving.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum EjectRate {
    /// Slow, continuous ejection. The top stage is never engaged.
    Normal,
    Fast,
    ExtraFast,
}

/// Speed settings of the intake rollers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntakeSpeed {
    Full,
    TwoThirds,
    Half,
    OneFourth,
    Reverse,
    ReverseHalf,
    ReverseOneThird,
    ReverseOneFourth,
    ReverseOneFifth,
    Off,
}

/// A single step of a mission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum MissionCmd {
    /// Drive to the given goal
    Drive(Goal),

    /// Run the scoring sequence with the given ejection variant
    Score { variant: u8 },

    /// Set the intake rollers
    Intake(IntakeSpeed),

    /// Set both feeder stages to fixed speeds
    Feeders { top: f64, middle: f64 },

    /// Stop the drive wheels
    StopDrive(BrakeMode),

    /// Keep ticking without commanding anything for the given time
    Wait { ms: u64 },
}

/// Possible mission command parsing errors.
#[derive(Debug, Error)]
pub enum MissionCmdParseError {
    #[error("Mission command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Goal {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            heading_deg: 0.0,
            move_speed: 127.0,
            turn_speed: 40.0,
            position_tolerance: 100.0,
            angle_tolerance: 6.0,
            store: false,
            eject: None,
            stop_on_contact: false,
        }
    }
}

impl Goal {
    /// Create a goal at the given pose with default speeds and tolerances.
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self {
            x,
            y,
            heading_deg,
            ..Self::default()
        }
    }
}

impl IntakeSpeed {
    /// Signed speed of the left roller.
    ///
    /// Derived from a full speed of 127 in integer steps, the same way as the feeder speeds, so
    /// two thirds is 127 / 3 * 2 = 84. Reverse half is a true division by 2.5.
    pub fn roller_speed(&self) -> f64 {
        match self {
            IntakeSpeed::Full => 127.0,
            IntakeSpeed::TwoThirds => 84.0,
            IntakeSpeed::Half => 63.0,
            IntakeSpeed::OneFourth => 31.0,
            IntakeSpeed::Reverse => -127.0,
            IntakeSpeed::ReverseHalf => -50.8,
            IntakeSpeed::ReverseOneThird => -42.0,
            IntakeSpeed::ReverseOneFourth => -31.0,
            IntakeSpeed::ReverseOneFifth => -25.0,
            IntakeSpeed::Off => 0.0,
        }
    }
}

impl MissionCmd {
    /// Parse a command from its JSON representation.
    pub fn from_json(json_str: &str) -> Result<Self, MissionCmdParseError> {
        serde_json::from_str(json_str).map_err(MissionCmdParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_drive() {
        let cmd = MissionCmd::from_json(
            r#"{"type": "Drive", "payload": {"x": 0.0, "y": 250.0, "store": true}}"#,
        )
        .unwrap();

        match cmd {
            MissionCmd::Drive(goal) => {
                assert_eq!(goal.y, 250.0);
                assert!(goal.store);
                assert_eq!(goal.move_speed, 127.0);
                assert_eq!(goal.eject, None);
            }
            _ => panic!("Expected a drive command, got {:?}", cmd),
        }
    }

    #[test]
    fn test_parse_others() {
        assert_eq!(
            MissionCmd::from_json(r#"{"type": "Score", "payload": {"variant": 3}}"#).unwrap(),
            MissionCmd::Score { variant: 3 }
        );
        assert_eq!(
            MissionCmd::from_json(r#"{"type": "Intake", "payload": "ReverseHalf"}"#).unwrap(),
            MissionCmd::Intake(IntakeSpeed::ReverseHalf)
        );
        assert_eq!(
            MissionCmd::from_json(r#"{"type": "StopDrive", "payload": "Hold"}"#).unwrap(),
            MissionCmd::StopDrive(BrakeMode::Hold)
        );
        assert!(MissionCmd::from_json(r#"{"type": "Fly"}"#).is_err());
    }

    #[test]
    fn test_intake_roller_speeds() {
        assert_eq!(IntakeSpeed::Full.roller_speed(), 127.0);
        assert_eq!(IntakeSpeed::TwoThirds.roller_speed(), 84.0);
        assert_eq!(IntakeSpeed::Half.roller_speed(), 63.0);
        assert_eq!(IntakeSpeed::OneFourth.roller_speed(), 31.0);
        assert_eq!(IntakeSpeed::ReverseHalf.roller_speed(), -50.8);
        assert_eq!(IntakeSpeed::ReverseOneThird.roller_speed(), -42.0);
        assert_eq!(IntakeSpeed::ReverseOneFifth.roller_speed(), -25.0);
        assert_eq!(IntakeSpeed::Off.roller_speed(), 0.0);
    }
}
