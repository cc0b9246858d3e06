//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use veh_if::eqpt::ProxThreshold;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {

    /// Distance to the goal below which the translation demand is scaled down.
    pub close_move_dist: f64,

    /// Gain added to the distance ratio when scaling the translation demand.
    pub move_base_gain: f64,

    /// Heading error below which the turn demand is scaled down.
    ///
    /// Units: degrees
    pub close_turn_deg: f64,

    /// Gain added to the heading error ratio when scaling the turn demand.
    pub turn_base_gain: f64,

    /// Contact sensor threshold
    pub contact: ProxThreshold,

    /// Minimum time between two counted contact samples.
    ///
    /// Units: milliseconds
    pub contact_sample_spacing_ms: u64,

    /// Number of consecutive contact samples that stop the vehicle.
    pub contact_sample_count: u32,

    /// Goal heading which requests a back off rather than a stop on contact.
    ///
    /// Units: degrees
    pub back_off_heading_deg: f64,

    /// The back off only happens past this x position.
    pub back_off_min_x: f64,

    /// Wheel speed of the back off.
    pub back_off_speed: f64,

    /// Duration of the back off.
    ///
    /// Units: milliseconds
    pub back_off_duration_ms: u64,

    /// Optional diagnostic timeout on a single goal. No timeout if not set.
    ///
    /// Units: milliseconds
    #[serde(default)]
    pub diag_timeout_ms: Option<u64>
}

impl Default for Params {
    fn default() -> Self {
        Self {
            close_move_dist: 400.0,
            move_base_gain: 0.11,
            close_turn_deg: 35.0,
            turn_base_gain: 0.1,
            contact: ProxThreshold::below(1700.0),
            contact_sample_spacing_ms: 10,
            contact_sample_count: 4,
            back_off_heading_deg: 92.0,
            back_off_min_x: 850.0,
            back_off_speed: 80.0,
            back_off_duration_ms: 75,
            diag_timeout_ms: None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/traj_ctrl.toml")).unwrap();

        assert_eq!(params, Params::default());
        assert!(params.diag_timeout_ms.is_none());
    }
}
