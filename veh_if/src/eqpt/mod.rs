//! # Equipment Interface
//!
//! This module defines the traits through which the control core reads its sensors and drives
//! its actuators, together with the identifiers of every channel on the vehicle.
//!
//! All reads and writes are infallible. A disconnected sensor simply reports a stale value and
//! a stalled actuator simply doesn't move, neither is detected at this level.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod mech;
pub mod prox;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use mech::{ActLimits, MechDems};
pub use prox::{Polarity, ProxThreshold};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The four drive wheels, in the order front-left, back-left, front-right, back-right.
pub const DRV_IDS: [ActId; 4] = [ActId::DrvFL, ActId::DrvBL, ActId::DrvFR, ActId::DrvBR];

/// Both feeder stages of the conveyance mechanism.
pub const FEED_IDS: [ActId; 2] = [ActId::FeedTop, ActId::FeedMiddle];

/// Both intake rollers.
pub const INTAKE_IDS: [ActId; 2] = [ActId::IntakeL, ActId::IntakeR];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators available on the vehicle
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum ActId {
    DrvFL,
    DrvBL,
    DrvFR,
    DrvBR,
    FeedTop,
    FeedMiddle,
    IntakeL,
    IntakeR,
}

/// IDs of the relative motion (tracking wheel) encoders.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum EncId {
    /// Fore-aft tracking wheel on the left side
    Left,
    /// Fore-aft tracking wheel on the right side
    Right,
    /// Lateral tracking wheel at the centre
    Centre,
}

/// IDs of the analog proximity sensors.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ProxId {
    /// Gate at the top (ejection) position of the conveyance
    Top,
    /// Gate at the middle (holding) position of the conveyance
    Middle,
    /// Contact sensor on the front of the vehicle, used for early stops
    Contact,
}

/// What an actuator does when commanded to zero speed.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum BrakeMode {
    Coast,
    Hold,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Write access to the vehicle's motors.
pub trait Actuators {
    /// Command a signed speed, in the actuator's percentage-style speed units.
    fn set_speed(&mut self, id: ActId, speed: f64);

    /// Set the behaviour of the actuator at zero speed.
    fn set_brake_mode(&mut self, id: ActId, mode: BrakeMode);

    /// Cumulative rotation of the actuator.
    fn get_position(&self, id: ActId) -> f64;

    /// Command a raw voltage. A zero voltage releases the actuator's torque entirely.
    fn set_voltage(&mut self, id: ActId, voltage: f64);
}

/// Read access to the vehicle's sensors.
pub trait Sensors {
    /// Raw heading from the absolute heading sensor in degrees. Not guaranteed to be in
    /// [0, 360).
    fn heading_deg(&self) -> f64;

    /// Cumulative tick count of a tracking wheel encoder.
    fn encoder(&self, id: EncId) -> f64;

    /// Raw analog value of a proximity sensor.
    fn proximity(&self, id: ProxId) -> f64;
}

/// The cooperative scheduler's time source.
pub trait Clock {
    /// Milliseconds since the start of the program.
    fn now_ms(&self) -> u64;

    /// Block until the start of the next control tick.
    fn wait_tick(&mut self);
}

/// Complete equipment of the vehicle.
pub trait Eqpt: Actuators + Sensors + Clock {}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> Eqpt for T where T: Actuators + Sensors + Clock {}
