//! # Trajectory controllers module
//!
//! This module provides the proportional controllers used by TrajCtrl, including their error
//! calculations. There are no integral or derivative terms, the demands are shaped by the
//! remaining error only.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use super::{Params, StatusReport};
use crate::loc::Pose;
use util::maths::{ang_dist_deg, norm_deg};
use veh_if::mission::Goal;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Counts consecutive contact sensor samples.
///
/// A sample is only counted if enough time has passed since the previous counted one. A reading
/// with no contact resets the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactMonitor {
    last_sample_ms: Option<u64>,

    count: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ContactMonitor {

    /// Feed a new reading into the monitor, returning the current count.
    pub fn sample(&mut self, present: bool, now_ms: u64, spacing_ms: u64) -> u32 {
        if !present {
            self.count = 0;
            return self.count
        }

        let due = match self.last_sample_ms {
            Some(t) => now_ms.saturating_sub(t) > spacing_ms,
            None => true
        };

        if due {
            self.count += 1;
            self.last_sample_ms = Some(now_ms);
        }

        self.count
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Returns true if the heading is within the tolerance band around the goal heading.
///
/// The band is inclusive and works across the 0/360 wrap.
pub fn within_band(heading_deg: f64, goal_heading_deg: f64, tolerance_deg: f64) -> bool {
    ang_dist_deg(heading_deg, goal_heading_deg).abs() <= tolerance_deg
}

/// Returns true if both the position and heading of the goal are satisfied.
pub fn goal_reached(pose: &Pose, goal: &Goal) -> bool {
    pose.dist_to(&Vector2::new(goal.x, goal.y)) <= goal.position_tolerance
        &&
        within_band(pose.heading_deg, goal.heading_deg, goal.angle_tolerance)
}

/// Calculate the body frame translation demand `(fwd, lat)` towards the goal.
pub fn translation_demand(
    pose: &Pose,
    goal: &Goal,
    params: &Params,
    report: &mut StatusReport
) -> (f64, f64) {
    let target = Vector2::new(goal.x, goal.y);

    let dist = pose.dist_to(&target);
    let bearing_deg = pose.bearing_to_deg(&target);

    // Angle of the goal as seen from the body frame, measured the other way round
    let difference_deg = 360.0 - norm_deg(pose.heading_deg - bearing_deg);
    let (sin_d, cos_d) = difference_deg.to_radians().sin_cos();

    let full_fwd = cos_d * goal.move_speed;
    let full_lat = sin_d * goal.move_speed;

    let (mut fwd, mut lat) = (full_fwd, full_lat);

    if dist <= params.close_move_dist {
        let scale = dist / params.close_move_dist + params.move_base_gain;
        fwd *= scale;
        lat *= scale;
    }

    // Never exceed the commanded speed, fall back to the unscaled demand
    if fwd.abs() > goal.move_speed {
        fwd = full_fwd;
    }
    if lat.abs() > goal.move_speed {
        lat = full_lat;
    }

    report.dist = dist;
    report.bearing_deg = bearing_deg;
    report.fwd_dem = fwd;
    report.lat_dem = lat;

    (fwd, lat)
}

/// Calculate the turn demand towards the goal heading.
///
/// The vehicle always turns the short way round. Inside the tolerance band no turn is demanded.
pub fn turn_demand(
    heading_deg: f64,
    goal: &Goal,
    params: &Params,
    report: &mut StatusReport
) -> f64 {
    let error_deg = ang_dist_deg(goal.heading_deg, heading_deg);
    let abs_error_deg = error_deg.abs();

    let magnitude = if abs_error_deg < params.close_turn_deg {
        goal.turn_speed * (abs_error_deg / params.close_turn_deg + params.turn_base_gain)
    }
    else {
        goal.turn_speed
    };

    let in_band = within_band(heading_deg, goal.heading_deg, goal.angle_tolerance);

    let turn = if in_band {
        0.0
    }
    else if error_deg < 0.0 {
        -magnitude
    }
    else {
        magnitude
    };

    report.turn_error_deg = error_deg;
    report.turn_dem = turn;
    report.in_band = in_band;

    turn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_within_band() {
        // Band wrapping below zero
        assert!(within_band(358.0, 5.0, 10.0));
        assert!(within_band(12.0, 5.0, 10.0));
        assert!(within_band(355.0, 5.0, 10.0));
        assert!(!within_band(180.0, 5.0, 10.0));
        assert!(!within_band(354.0, 5.0, 10.0));

        // Band wrapping above 360
        assert!(within_band(2.0, 355.0, 10.0));
        assert!(within_band(350.0, 355.0, 10.0));
        assert!(!within_band(6.0, 355.0, 10.0));

        // No wrap
        assert!(within_band(95.0, 90.0, 6.0));
        assert!(!within_band(97.0, 90.0, 6.0));
    }

    #[test]
    fn test_turn_short_way() {
        let params = Params::default();
        let mut report = StatusReport::default();

        let mut goal = Goal::new(0.0, 0.0, 10.0);
        goal.turn_speed = 40.0;
        goal.angle_tolerance = 2.0;

        // From 350 the short way to 10 increases the heading
        assert!(turn_demand(350.0, &goal, &params, &mut report) > 0.0);
        assert_eq!(report.turn_error_deg, 20.0);

        // From 30 the short way to 10 decreases it
        assert!(turn_demand(30.0, &goal, &params, &mut report) < 0.0);

        // Far away gives full speed
        assert_eq!(turn_demand(180.0, &goal, &params, &mut report).abs(), 40.0);

        // Inside the band there is no turn
        assert_eq!(turn_demand(11.0, &goal, &params, &mut report), 0.0);
        assert!(report.in_band);
    }

    #[test]
    fn test_turn_shaping() {
        let params = Params::default();
        let mut report = StatusReport::default();

        let mut goal = Goal::new(0.0, 0.0, 90.0);
        goal.turn_speed = 40.0;
        goal.angle_tolerance = 1.0;

        let turn = turn_demand(60.0, &goal, &params, &mut report);
        assert!(turn > 0.0);
        assert!(turn < 40.0);

        // Just inside the close band the shaped demand can exceed the turn speed
        let expected = 40.0 * (35.0 / 35.0 + 0.1);
        let turn = turn_demand(55.001, &goal, &params, &mut report);
        assert!((turn - expected).abs() < 0.01);
    }

    #[test]
    fn test_translation() {
        let params = Params::default();
        let mut report = StatusReport::default();

        // Far goal straight ahead gives full forward speed
        let goal = Goal::new(0.0, 1000.0, 0.0);
        let (fwd, lat) = translation_demand(&Pose::new(0.0, 0.0, 0.0), &goal, &params, &mut report);
        assert!((fwd - 127.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);

        // Goal to the right while facing +y is pure lateral
        let goal = Goal::new(1000.0, 0.0, 0.0);
        let (fwd, lat) = translation_demand(&Pose::new(0.0, 0.0, 0.0), &goal, &params, &mut report);
        assert!(fwd.abs() < 1e-9);
        assert!((lat - 127.0).abs() < 1e-9);

        // Same goal while facing +x is pure forward
        let (fwd, lat) = translation_demand(&Pose::new(0.0, 0.0, 90.0), &goal, &params, &mut report);
        assert!((fwd - 127.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);

        // Close to the goal the demand is scaled
        let goal = Goal::new(0.0, 200.0, 0.0);
        let (fwd, _) = translation_demand(&Pose::new(0.0, 0.0, 0.0), &goal, &params, &mut report);
        assert!((fwd - 127.0 * (0.5 + 0.11)).abs() < 1e-9);
        assert_eq!(report.dist, 200.0);
    }

    #[test]
    fn test_contact_monitor() {
        let mut mon = ContactMonitor::default();

        assert_eq!(mon.sample(true, 100, 10), 1);
        assert_eq!(mon.sample(true, 105, 10), 1);
        assert_eq!(mon.sample(true, 110, 10), 1);
        assert_eq!(mon.sample(true, 111, 10), 2);
        assert_eq!(mon.sample(false, 130, 10), 0);
        assert_eq!(mon.sample(true, 131, 10), 1);
    }
}
