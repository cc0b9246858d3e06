//! # Trajectory control module
//!
//! Trajectory control drives the vehicle to a single goal pose. It is a reactive point to point
//! regulator: every tick it computes the distance and bearing to the goal position and the error
//! to the goal heading, and outputs a holonomic manouvre which translates and turns at the same
//! time.
//!
//! Translation is commanded at the goal's move speed, scaled down in proportion to the remaining
//! distance once inside the close distance. Turning works the same way with the heading error and
//! the close turn angle, and always goes the short way round. Heading comparisons are all done
//! with a signed angular distance so goals near 0/360 need no special treatment.
//!
//! A goal can also be finished early by the contact sensor on the front of the vehicle, either by
//! stopping in place or, for the back off heading, by reversing away for a short time.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::Params;
pub use state::*;
