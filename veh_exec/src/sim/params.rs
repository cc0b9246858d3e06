//! Simulated vehicle parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use veh_if::eqpt::ProxId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Length of one tick.
    ///
    /// Units: milliseconds
    pub tick_ms: u64,

    /// Sleep for the length of each tick, so that the simulation runs in real time
    pub real_time: bool,

    /// Tracking wheel travel per unit of body speed per tick
    pub dist_per_speed_tick: f64,

    /// Heading change per unit of turn speed per tick.
    ///
    /// Units: degrees
    pub deg_per_speed_tick: f64,

    /// Feeder rotation per unit of speed per tick
    pub feed_pos_per_speed_tick: f64,

    /// Voltage corresponding to full speed.
    ///
    /// Units: millivolts
    pub full_speed_voltage: f64,

    /// Full speed in actuator speed units
    pub full_speed: f64,

    /// Heading the vehicle starts at. The estimated position always starts at the origin.
    ///
    /// Units: degrees
    pub start_heading_deg: f64,

    /// Proximity readings before any event
    pub initial_prox: ProxLevels,

    /// Scripted changes of the proximity readings
    pub prox_events: Vec<ProxEvent>,
}

/// A reading for every proximity sensor.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ProxLevels {
    pub top: f64,
    pub middle: f64,
    pub contact: f64,
}

/// Change of one proximity reading at a given time.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ProxEvent {
    pub sensor: ProxId,

    /// Units: milliseconds
    pub at_ms: u64,

    pub value: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            tick_ms: 1,
            real_time: false,
            dist_per_speed_tick: 0.02,
            deg_per_speed_tick: 0.01,
            feed_pos_per_speed_tick: 0.05,
            full_speed_voltage: 12000.0,
            full_speed: 127.0,
            start_heading_deg: 0.0,
            initial_prox: ProxLevels::default(),
            prox_events: Vec::new(),
        }
    }
}

impl Default for ProxLevels {
    fn default() -> Self {
        Self {
            top: 0.0,
            middle: 0.0,
            contact: 2000.0,
        }
    }
}

impl ProxLevels {
    pub fn get(&self, id: ProxId) -> f64 {
        match id {
            ProxId::Top => self.top,
            ProxId::Middle => self.middle,
            ProxId::Contact => self.contact,
        }
    }

    pub fn set(&mut self, id: ProxId, value: f64) {
        match id {
            ProxId::Top => self.top = value,
            ProxId::Middle => self.middle = value,
            ProxId::Contact => self.contact = value,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let mut params: Params =
            util::params::from_str(include_str!("../../../params/sim.toml")).unwrap();

        // Only the scripted events differ from the defaults
        assert_eq!(params.prox_events.len(), 5);
        assert_eq!(
            params.prox_events[2],
            ProxEvent {
                sensor: ProxId::Contact,
                at_ms: 2500,
                value: 1000.0
            }
        );

        params.prox_events.clear();
        assert_eq!(params, Params::default());
    }
}
