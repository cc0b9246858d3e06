//! # Simulated vehicle
//!
//! A simple kinematic stand in for the real vehicle, implementing the equipment traits so the
//! control core can be run and tested without hardware.
//!
//! Wheel speeds are unmixed back into body frame motion, which is integrated each tick into the
//! tracking wheel encoders and the heading. Feeder positions integrate their speeds. Proximity
//! readings are driven by a list of timed events rather than by any model of the conveyance.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{collections::BTreeMap, thread, time::Duration};

use log::trace;
use veh_if::eqpt::{
    ActId, Actuators, BrakeMode, Clock, EncId, ProxId, Sensors, DRV_IDS, FEED_IDS,
};

use util::{maths::wrap_deg, params as param_load};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated vehicle state
#[derive(Debug, Clone)]
pub struct SimVehicle {
    params: Params,

    now_ms: u64,

    /// True heading, unbounded
    heading_deg: f64,

    /// True position in the field frame
    position: (f64, f64),

    fwd_accum: f64,
    lat_accum: f64,

    speed: BTreeMap<ActId, f64>,
    brake: BTreeMap<ActId, BrakeMode>,
    position_accum: BTreeMap<ActId, f64>,

    prox: ProxLevels,

    /// Events not yet applied, in time order
    pending_events: Vec<ProxEvent>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(param_load::LoadError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimVehicle {
    /// Initialise the simulation from a parameter file.
    pub fn init(params_path: &str) -> Result<Self, SimError> {
        let params = param_load::load(params_path).map_err(SimError::ParamLoadError)?;

        Ok(Self::new(params))
    }

    pub fn new(params: Params) -> Self {
        let mut pending_events = params.prox_events.clone();
        pending_events.sort_by_key(|e| e.at_ms);

        let mut sim = Self {
            now_ms: 0,
            heading_deg: params.start_heading_deg,
            position: (0.0, 0.0),
            fwd_accum: 0.0,
            lat_accum: 0.0,
            speed: BTreeMap::new(),
            brake: BTreeMap::new(),
            position_accum: BTreeMap::new(),
            prox: params.initial_prox,
            pending_events,
            params,
        };

        sim.apply_events();

        sim
    }

    /// True position of the vehicle in the field frame.
    pub fn true_position(&self) -> (f64, f64) {
        self.position
    }

    /// Last commanded speed of an actuator.
    pub fn speed(&self, id: ActId) -> f64 {
        self.speed.get(&id).copied().unwrap_or(0.0)
    }

    pub fn brake_mode(&self, id: ActId) -> Option<BrakeMode> {
        self.brake.get(&id).copied()
    }

    /// Advance the simulation by one tick.
    fn step(&mut self) {
        self.now_ms += self.params.tick_ms;

        let [fl, bl, fr, br] = {
            let mut s = [0.0; 4];
            for (i, id) in DRV_IDS.iter().enumerate() {
                s[i] = self.speed(*id);
            }
            s
        };

        let fwd = (fl + bl - fr - br) / 4.0;
        let lat = (fl - bl + fr - br) / 4.0;
        let turn = (fl + bl + fr + br) / 4.0;

        let ticks = self.params.tick_ms as f64;

        self.heading_deg += turn * self.params.deg_per_speed_tick * ticks;

        let d_fwd = fwd * self.params.dist_per_speed_tick * ticks;
        let d_lat = lat * self.params.dist_per_speed_tick * ticks;

        self.fwd_accum += d_fwd;
        self.lat_accum += d_lat;

        let (sin_h, cos_h) = self.heading_deg.to_radians().sin_cos();
        self.position.0 += d_fwd * sin_h + d_lat * cos_h;
        self.position.1 += d_fwd * cos_h - d_lat * sin_h;

        for id in FEED_IDS.iter() {
            let d_pos = self.speed(*id) * self.params.feed_pos_per_speed_tick * ticks;
            *self.position_accum.entry(*id).or_insert(0.0) += d_pos;
        }

        self.apply_events();

        trace!(
            "Sim at {} ms: ({:.2}, {:.2}) @ {:.2} deg",
            self.now_ms,
            self.position.0,
            self.position.1,
            self.heading_deg
        );
    }

    fn apply_events(&mut self) {
        let now_ms = self.now_ms;
        let due = self
            .pending_events
            .iter()
            .take_while(|e| e.at_ms <= now_ms)
            .count();

        for event in self.pending_events.drain(..due) {
            self.prox.set(event.sensor, event.value);
        }
    }
}

impl Actuators for SimVehicle {
    fn set_speed(&mut self, id: ActId, speed: f64) {
        self.speed.insert(id, speed);
    }

    fn set_brake_mode(&mut self, id: ActId, mode: BrakeMode) {
        self.brake.insert(id, mode);
    }

    fn get_position(&self, id: ActId) -> f64 {
        self.position_accum.get(&id).copied().unwrap_or(0.0)
    }

    fn set_voltage(&mut self, id: ActId, voltage: f64) {
        let speed = voltage / self.params.full_speed_voltage * self.params.full_speed;
        self.speed.insert(id, speed);
    }
}

impl Sensors for SimVehicle {
    fn heading_deg(&self) -> f64 {
        wrap_deg(self.heading_deg)
    }

    fn encoder(&self, id: EncId) -> f64 {
        match id {
            EncId::Left | EncId::Right => self.fwd_accum,
            EncId::Centre => self.lat_accum,
        }
    }

    fn proximity(&self, id: ProxId) -> f64 {
        self.prox.get(id)
    }
}

impl Clock for SimVehicle {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn wait_tick(&mut self) {
        if self.params.real_time {
            thread::sleep(Duration::from_millis(self.params.tick_ms));
        }

        self.step();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loco_ctrl::mix;

    fn drive(sim: &mut SimVehicle, fwd: f64, lat: f64, turn: f64) {
        for (id, speed) in DRV_IDS.iter().zip(mix(fwd, lat, turn).iter()) {
            sim.set_speed(*id, *speed);
        }
    }

    #[test]
    fn test_drive_forward() {
        let mut sim = SimVehicle::new(Params::default());

        drive(&mut sim, 50.0, 0.0, 0.0);
        for _ in 0..100 {
            sim.wait_tick();
        }

        assert_eq!(sim.now_ms(), 100);
        assert!((sim.encoder(EncId::Left) - 100.0).abs() < 1e-9);
        assert!(sim.encoder(EncId::Centre).abs() < 1e-9);
        assert!((sim.true_position().1 - 100.0).abs() < 1e-9);
        assert!(sim.true_position().0.abs() < 1e-9);
    }

    #[test]
    fn test_turn_and_strafe() {
        let mut sim = SimVehicle::new(Params::default());

        // Turning increases the heading
        drive(&mut sim, 0.0, 0.0, 100.0);
        for _ in 0..100 {
            sim.wait_tick();
        }
        assert!((sim.heading_deg() - 100.0).abs() < 1e-9);

        // Strafing right at heading 90 moves towards -y
        let mut sim = SimVehicle::new(Params {
            start_heading_deg: 90.0,
            ..Params::default()
        });
        drive(&mut sim, 0.0, 50.0, 0.0);
        for _ in 0..10 {
            sim.wait_tick();
        }
        assert!((sim.true_position().1 + 10.0).abs() < 1e-9);
        assert!((sim.encoder(EncId::Centre) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_raw_range() {
        let sim = SimVehicle::new(Params {
            start_heading_deg: 270.0,
            ..Params::default()
        });
        assert!((sim.heading_deg() + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_feeders_and_voltage() {
        let mut sim = SimVehicle::new(Params::default());

        sim.set_speed(ActId::FeedTop, -100.0);
        sim.wait_tick();
        assert!((sim.get_position(ActId::FeedTop) + 5.0).abs() < 1e-9);

        sim.set_voltage(ActId::FeedTop, 6000.0);
        assert!((sim.speed(ActId::FeedTop) - 63.5).abs() < 1e-9);

        sim.set_voltage(ActId::FeedTop, 0.0);
        sim.wait_tick();
        assert!((sim.get_position(ActId::FeedTop) + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_prox_events() {
        let mut sim = SimVehicle::new(Params {
            prox_events: vec![
                ProxEvent {
                    sensor: ProxId::Middle,
                    at_ms: 5,
                    value: 1900.0,
                },
                ProxEvent {
                    sensor: ProxId::Contact,
                    at_ms: 2,
                    value: 1000.0,
                },
            ],
            ..Params::default()
        });

        assert_eq!(sim.proximity(ProxId::Contact), 2000.0);
        assert_eq!(sim.proximity(ProxId::Middle), 0.0);

        sim.wait_tick();
        sim.wait_tick();
        assert_eq!(sim.proximity(ProxId::Contact), 1000.0);
        assert_eq!(sim.proximity(ProxId::Middle), 0.0);

        for _ in 0..3 {
            sim.wait_tick();
        }
        assert_eq!(sim.proximity(ProxId::Middle), 1900.0);
    }
}
