//! # Vehicle interface crate.
//!
//! Provides the interfaces shared between the vehicle software crates: the equipment the control
//! core drives and senses through, and the mission commands that sequence it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment traits, identifiers and actuator demands
pub mod eqpt;

/// Mission commands and goals
pub mod mission;
