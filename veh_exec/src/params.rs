//! # Vehicle Executable Parameters
//!
//! This module provide parameters for the vehicle executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use veh_if::eqpt::ActLimits;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VehExecParams {
    /// Minimum level of log messages, one of `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,

    /// Directory, relative to the software root, in which sessions are created
    pub sessions_dir: String,

    /// Limits applied to every actuator demand
    pub act_limits: ActLimits,
}
