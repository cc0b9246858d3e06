//! # Locomotion control module
//!
//! Converts body frame manouvre commands into individual wheel speed demands for the holonomic
//! base. The four wheels sit at +-45 degrees to the body axes, so each translation axis and the
//! turn are distributed over all of them.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{trace, warn};
use serde::Serialize;
use veh_if::eqpt::{MechDems, DRV_IDS};

pub use cmd::*;
pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of drive axes on the vehicle.
pub const NUM_DRV_AXES: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
#[derive(Debug, Default)]
pub struct LocoCtrl {
    params: Params,

    report: StatusReport,
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True for each wheel whose demand was limited, in front-left, back-left, front-right,
    /// back-right order
    pub drv_speed_limited: [bool; NUM_DRV_AXES],

    /// True if the command was rejected for containing non-finite values
    pub invalid_cmd: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocoCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            report: StatusReport::default(),
        }
    }

    /// Calculate the wheel demands for a manouvre.
    ///
    /// An invalid command is replaced by no demands at all, so the wheels carry on with their
    /// previous demands.
    pub fn proc(&mut self, cmd: &MnvrCmd) -> (MechDems, StatusReport) {
        self.report = StatusReport::default();

        let mut dems = MechDems::new();

        if !cmd.is_valid() {
            warn!("Rejecting invalid manouvre command {:?}", cmd);
            self.report.invalid_cmd = true;
            return (dems, self.report);
        }

        match *cmd {
            MnvrCmd::Holonomic { fwd, lat, turn } => {
                let speeds = self.enforce_limits(mix(fwd, lat, turn));

                for (id, speed) in DRV_IDS.iter().zip(speeds.iter()) {
                    dems.set_speed(*id, *speed);
                }

                trace!("LocoCtrl wheel demands: {:?}", speeds);
            }
            MnvrCmd::Stop(mode) => dems.stop(&DRV_IDS, mode),
        }

        (dems, self.report)
    }

    /// Limit each wheel to the maximum speed, raising the matching status flag.
    fn enforce_limits(&mut self, mut speeds: [f64; NUM_DRV_AXES]) -> [f64; NUM_DRV_AXES] {
        let max = self.params.wheel_max_abs_speed;

        for (i, speed) in speeds.iter_mut().enumerate() {
            if *speed > max {
                *speed = max;
                self.report.drv_speed_limited[i] = true;
            } else if *speed < -max {
                *speed = -max;
                self.report.drv_speed_limited[i] = true;
            }
        }

        speeds
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Holonomic mixing of a body frame command into front-left, back-left, front-right and
/// back-right wheel speeds.
pub fn mix(fwd: f64, lat: f64, turn: f64) -> [f64; NUM_DRV_AXES] {
    [
        fwd + lat + turn,
        fwd - lat + turn,
        -fwd + lat + turn,
        -fwd - lat + turn,
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use veh_if::eqpt::{ActId, BrakeMode};

    #[test]
    fn test_mix_invariant() {
        let cmds = [
            (0.0, 0.0, 0.0),
            (50.0, 0.0, 0.0),
            (0.0, -30.0, 0.0),
            (10.0, 20.0, 30.0),
            (-40.5, 12.25, -7.0),
            (60.0, -60.0, 5.0),
        ];

        for (fwd, lat, turn) in cmds.iter() {
            let [fl, bl, fr, br] = mix(*fwd, *lat, *turn);
            assert!((fl + br - 2.0 * turn).abs() < 1e-9);
            assert!((bl + fr - 2.0 * turn).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reverse_drive_pattern() {
        // A pure reverse drive commands the left wheels backwards and the right wheels forwards
        assert_eq!(mix(-80.0, 0.0, 0.0), [-80.0, -80.0, 80.0, 80.0]);
    }

    #[test]
    fn test_limits() {
        let mut loco_ctrl = LocoCtrl::new(Params::default());

        let (dems, report) = loco_ctrl.proc(&MnvrCmd::Holonomic {
            fwd: 127.0,
            lat: 0.0,
            turn: 40.0,
        });

        assert_eq!(dems.speed.get(&ActId::DrvFL), Some(&127.0));
        assert_eq!(dems.speed.get(&ActId::DrvFR), Some(&-87.0));
        assert_eq!(report.drv_speed_limited, [true, true, false, false]);
    }

    #[test]
    fn test_stop_and_invalid() {
        let mut loco_ctrl = LocoCtrl::new(Params::default());

        let (dems, _) = loco_ctrl.proc(&MnvrCmd::Stop(BrakeMode::Hold));
        for id in DRV_IDS.iter() {
            assert_eq!(dems.brake.get(id), Some(&BrakeMode::Hold));
            assert_eq!(dems.speed.get(id), Some(&0.0));
        }

        let (dems, report) = loco_ctrl.proc(&MnvrCmd::Holonomic {
            fwd: f64::NAN,
            lat: 0.0,
            turn: 0.0,
        });
        assert!(dems.is_empty());
        assert!(report.invalid_cmd);
    }
}
