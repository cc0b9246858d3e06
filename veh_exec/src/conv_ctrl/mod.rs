//! # Conveyance control module
//!
//! The conveyance moves objects from the intake, through a middle holding position, up to the top
//! ejection position. Each position has a proximity gate and each stage has its own feeder motor.
//!
//! At the start of a drive segment the feeders are set once, depending on whether the segment
//! stores or ejects objects. Then on every tick of the segment:
//!
//! 1. The top stage engages when an object reaches the top gate, latching a target position just
//!    below it, and holds that position from then on.
//! 2. Once the top stage has been engaged for the dwell time, a storing segment advances the
//!    middle stage until an object reaches the middle gate, where it latches and holds as well.
//!
//! Engagement is kept in the [`Engagement`] owned by the data store so it survives from one
//! segment to the next.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod servo;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use veh_if::{
    eqpt::{ActId, Actuators, BrakeMode, MechDems, ProxId, Sensors, FEED_IDS},
    mission::{EjectRate, Goal},
};

pub use params::*;
pub use servo::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Conveyance control module state
#[derive(Debug, Default)]
pub struct ConvCtrl {
    params: Params,

    /// True if the current segment stores objects
    store: bool,

    /// Eject rate of the current segment
    eject: Option<EjectRate>,

    report: StatusReport,
}

/// Sensor readings used by the conveyance.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ConvInput {
    pub now_ms: u64,
    pub top_prox: f64,
    pub middle_prox: f64,
    pub top_pos: f64,
    pub middle_pos: f64,
}

/// Status report for conveyance control.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    pub top: StageState,
    pub middle: StageState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ConvInput {
    /// Read the conveyance sensors from the equipment.
    pub fn read<E>(eqpt: &E, now_ms: u64) -> Self
    where
        E: Actuators + Sensors + ?Sized,
    {
        Self {
            now_ms,
            top_prox: eqpt.proximity(ProxId::Top),
            middle_prox: eqpt.proximity(ProxId::Middle),
            top_pos: eqpt.get_position(ActId::FeedTop),
            middle_pos: eqpt.get_position(ActId::FeedMiddle),
        }
    }
}

impl ConvCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Set the feeders for the start of a drive segment.
    pub fn begin_segment(
        &mut self,
        goal: &Goal,
        input: &ConvInput,
        eng: &mut Engagement,
        dems: &mut MechDems,
    ) {
        self.store = goal.store;
        self.eject = goal.eject;

        if self.store && !eng.top.is_engaged() {
            if self.params.top_gate.is_clear(input.top_prox) {
                self.set_feeders(self.params.store_fill, dems);
                self.set_states(StageState::Advancing, StageState::Advancing);
            } else if self.params.middle_gate_begin.is_clear(input.middle_prox)
                && !eng.middle.is_engaged()
            {
                self.set_feeders(self.params.store_advance, dems);
                self.set_states(StageState::Idle, StageState::Advancing);
            } else {
                dems.stop(&FEED_IDS, BrakeMode::Hold);

                // Already full, hold the object where it is
                if !eng.middle.is_engaged() {
                    eng.middle = StageLatch::Engaged {
                        since_ms: input.now_ms,
                        target_pos: input.middle_pos + self.params.middle_lock_offset,
                    };
                    self.set_states(StageState::Idle, StageState::PositionLocked);
                } else {
                    self.set_states(StageState::Idle, StageState::Holding);
                }
            }
        } else if let Some(rate) = self.eject {
            let speeds = match rate {
                EjectRate::Normal => self.params.eject_normal,
                EjectRate::Fast => self.params.eject_fast,
                EjectRate::ExtraFast => self.params.eject_extra_fast,
            };
            self.set_feeders(speeds, dems);
            self.set_states(StageState::Advancing, StageState::Advancing);
        }
    }

    /// Step the conveyance for one tick of a drive segment.
    pub fn step(&mut self, input: &ConvInput, eng: &mut Engagement, dems: &mut MechDems) {
        let mut top_state = self.report.top;
        let mut middle_state = self.report.middle;

        // ---- TOP STAGE ----

        if self.params.top_gate.is_present(input.top_prox)
            && self.eject != Some(EjectRate::Normal)
            && !eng.top.is_engaged()
        {
            eng.top = StageLatch::Engaged {
                since_ms: input.now_ms,
                target_pos: input.top_pos + self.params.top_lock_offset,
            };
            top_state = StageState::PositionLocked;
        } else if eng.top.is_engaged() {
            top_state = StageState::Holding;
        }

        if let Some(target) = eng.top.target() {
            dems.set_speed(
                ActId::FeedTop,
                self.params.top_servo.demand(input.top_pos, target),
            );
        }

        // ---- MIDDLE STAGE ----

        let dwell_done = eng
            .top
            .engaged_for_ms(input.now_ms)
            .map(|t| t > self.params.middle_dwell_ms)
            .unwrap_or(false);

        let mut locked_now = false;

        if dwell_done && self.store && !eng.middle.is_engaged() {
            if self.params.middle_gate.is_clear(input.middle_prox) {
                dems.set_speed(ActId::FeedMiddle, self.params.middle_advance_speed);
                middle_state = StageState::Advancing;
            } else {
                eng.middle = StageLatch::Engaged {
                    since_ms: input.now_ms,
                    target_pos: input.middle_pos + self.params.middle_lock_offset,
                };
                middle_state = StageState::PositionLocked;
                locked_now = true;
            }
        }

        if let Some(target) = eng.middle.target() {
            dems.set_speed(
                ActId::FeedMiddle,
                self.params.middle_servo.demand(input.middle_pos, target),
            );
            if !locked_now {
                middle_state = StageState::Holding;
            }
        }

        self.set_states(top_state, middle_state);
    }

    /// Release both feeders at the end of a drive segment.
    pub fn end_segment(&mut self, dems: &mut MechDems) {
        for id in FEED_IDS.iter() {
            dems.set_voltage(*id, 0.0);
        }

        self.store = false;
        self.eject = None;
        self.set_states(StageState::Idle, StageState::Idle);
    }

    fn set_feeders(&self, speeds: FeederSpeeds, dems: &mut MechDems) {
        dems.set_speed(ActId::FeedMiddle, speeds.middle);
        dems.set_speed(ActId::FeedTop, speeds.top);
    }

    fn set_states(&mut self, top: StageState, middle: StageState) {
        if top != self.report.top {
            debug!("Top stage {:?} -> {:?}", self.report.top, top);
        }
        if middle != self.report.middle {
            debug!("Middle stage {:?} -> {:?}", self.report.middle, middle);
        }

        self.report = StatusReport { top, middle };
    }
}
