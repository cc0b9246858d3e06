//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Params {
    /// Maximum absolute speed demand of a single wheel.
    ///
    /// Units: actuator speed units
    pub wheel_max_abs_speed: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_max_abs_speed: 127.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/loco_ctrl.toml")).unwrap();

        assert_eq!(params, Params::default());
    }
}
