//! # Vehicle library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the vehicle crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Conveyance control module - moves objects through the two stage conveyance while driving
pub mod conv_ctrl;

/// Global data store - the state shared between the modules over a whole mission
pub mod data_store;

/// Intake roller demands
pub mod intake;

/// Localisation module - dead reckoning of the vehicle pose
pub mod loc;

/// Locomotion control module - converts manouvre commands into individual wheel commands
pub mod loco_ctrl;

/// Mission execution - the blocking operations making up a mission
pub mod mission;

/// Executable parameters
pub mod params;

/// Scoring sequencer - the ejection sequences run between drive segments
pub mod score_seq;

/// Simulated vehicle equipment
pub mod sim;

/// Trajectory control module - drives the vehicle to a goal pose
pub mod traj_ctrl;
