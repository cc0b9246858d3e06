//! # Scoring sequencer module
//!
//! Runs a short, self contained ejection sequence between two drive segments. The sequence is
//! selected by its variant number and described entirely by an [`EjectionProfile`]; this module
//! provides the single executor stepping any profile tick by tick.
//!
//! Every sequence ends the same way, either on its hard timeout or, for profiles that count
//! objects, on an early exit: the top stage is held, both feeders are zeroed, the engagement of
//! both stages is cleared, the intake is stopped and the wheels coast.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod profile;
pub use profile::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use serde::Serialize;
use veh_if::{
    eqpt::{ActId, BrakeMode, MechDems},
    mission::IntakeSpeed,
};

use crate::{
    conv_ctrl::{ConvInput, Engagement, FeederSpeeds},
    intake,
    loco_ctrl::MnvrCmd,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scoring sequencer state
pub struct ScoreSeq {
    params: Params,

    mode: ScoreSeqMode,

    /// Profile of the running sequence
    profile: Option<EjectionProfile>,

    /// Time the sequence started
    begin_ms: u64,

    report: StatusReport,
}

/// Progress of the running sequence.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// Object detected at the middle gate
    pub phase1: bool,

    /// Object cleared the middle gate
    pub phase2: bool,

    /// Object detected at the top gate
    pub phase3: bool,

    /// Latched target of the middle stage
    pub middle_target: Option<f64>,

    /// Time scoring started
    pub scoring_since_ms: Option<u64>,

    /// Number of objects counted while scoring
    pub count: u32,

    /// True while a counted object is at the counting gate
    pub count_gate_occupied: bool,

    /// Conveyance has been held by the hold on detect phase
    pub held: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScoreSeqError {
    #[error("No ejection profile for variant {0}")]
    UnknownVariant(u8),

    #[error("Attempted to begin a sequence while one is already running")]
    AlreadyRunning,
}

/// How a sequence finished.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ScoreOutcome {
    /// Enough objects were counted
    EarlyExit,

    /// The hard time limit expired
    Timeout,
}

/// What to do at the end of a settle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SettleNext {
    /// Hold the top stage and carry on
    HoldTop,

    /// Finish the sequence early
    EarlyExit,
}

/// The possible modes of the sequencer. Each mode is handled by a `mode_xyz` function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreSeqMode {
    Off,
    Run,
    Settle { until_ms: u64, next: SettleNext },
    Finished(ScoreOutcome),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScoreSeq {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            mode: ScoreSeqMode::Off,
            profile: None,
            begin_ms: 0,
            report: StatusReport::default(),
        }
    }

    pub fn mode(&self) -> ScoreSeqMode {
        self.mode
    }

    /// The outcome of the sequence, or `None` if it's still running or there is none.
    pub fn outcome(&self) -> Option<ScoreOutcome> {
        match self.mode {
            ScoreSeqMode::Finished(o) => Some(o),
            _ => None,
        }
    }

    /// Clear a finished sequence, returning its outcome.
    pub fn end_sequence(&mut self) -> Option<ScoreOutcome> {
        let outcome = self.outcome();

        self.mode = ScoreSeqMode::Off;
        self.profile = None;

        outcome
    }

    /// Start the sequence of the given variant.
    ///
    /// Writes the initial feeder and intake demands, and returns the wheel manouvre to hold during
    /// the sequence if the profile has one.
    pub fn begin_sequence(
        &mut self,
        variant: u8,
        input: &ConvInput,
        dems: &mut MechDems,
    ) -> Result<Option<MnvrCmd>, ScoreSeqError> {
        if self.mode != ScoreSeqMode::Off {
            return Err(ScoreSeqError::AlreadyRunning);
        }

        let profile = self
            .params
            .get_profile(variant)
            .cloned()
            .ok_or(ScoreSeqError::UnknownVariant(variant))?;

        info!("Begining scoring sequence, variant {}", variant);

        set_feeders(profile.initial, dems);

        if profile.intake.off_at_start {
            intake::set_intake(dems, IntakeSpeed::Off);
        }

        let creep = profile.creep_speed.map(|fwd| MnvrCmd::Holonomic {
            fwd,
            lat: 0.0,
            turn: 0.0,
        });

        self.profile = Some(profile);
        self.begin_ms = input.now_ms;
        self.report = StatusReport::default();
        self.mode = ScoreSeqMode::Run;

        Ok(creep)
    }

    /// Step the sequence for one tick.
    pub fn proc(
        &mut self,
        input: &ConvInput,
        eng: &mut Engagement,
        dems: &mut MechDems,
    ) -> (Option<MnvrCmd>, StatusReport) {
        let profile = match self.profile {
            Some(ref p) => p.clone(),
            None => return (None, self.report),
        };

        let cmd = match self.mode {
            ScoreSeqMode::Off | ScoreSeqMode::Finished(_) => None,
            ScoreSeqMode::Run => self.mode_run(&profile, input, eng, dems),
            ScoreSeqMode::Settle { until_ms, next } => {
                self.mode_settle(&profile, until_ms, next, input, eng, dems)
            }
        };

        (cmd, self.report)
    }

    /// Mode run.
    ///
    /// Follows the profile's phases and checks for the end of the sequence.
    fn mode_run(
        &mut self,
        profile: &EjectionProfile,
        input: &ConvInput,
        eng: &mut Engagement,
        dems: &mut MechDems,
    ) -> Option<MnvrCmd> {
        let now_ms = input.now_ms;
        let elapsed_ms = now_ms.saturating_sub(self.begin_ms);

        // ---- GATE SEQUENCE ----

        if let Some(ref gates) = profile.gates {
            self.step_gates(gates, profile.scoring.as_ref(), input, elapsed_ms, dems);
        }

        // ---- SCORING ----

        if let Some(ref scoring) = profile.scoring {
            self.step_scoring(scoring, input, dems);
        }

        // ---- HOLD ON DETECT ----

        if let Some(ref hold) = profile.hold_on_detect {
            let time_ok = hold.min_ms.map(|m| elapsed_ms > m).unwrap_or(true);

            if !self.report.held && time_ok && hold.gate.is_present(input.middle_prox) {
                debug!("Object at the middle gate, holding");
                dems.stop(&[ActId::FeedMiddle], BrakeMode::Hold);
                self.report.held = true;

                match hold.settle_ms {
                    Some(settle_ms) => {
                        self.mode = ScoreSeqMode::Settle {
                            until_ms: now_ms + settle_ms,
                            next: SettleNext::HoldTop,
                        };
                        return None;
                    }
                    None => dems.stop(&[ActId::FeedTop], BrakeMode::Hold),
                }
            }
        }

        // ---- INTAKE ----

        let in_window = profile
            .intake
            .on_window
            .map(|w| elapsed_ms > w.from_ms && w.until_ms.map(|u| elapsed_ms < u).unwrap_or(true))
            .unwrap_or(false);

        if in_window {
            intake::set_intake(dems, IntakeSpeed::Full);
        } else if let Some(off_ms) = profile.intake.off_after_ms {
            if elapsed_ms > off_ms {
                intake::set_intake(dems, IntakeSpeed::Off);
            }
        }

        // ---- EXIT ----

        if let Some(ref scoring) = profile.scoring {
            if self.report.count >= scoring.early_exit_count {
                debug!("Counted {} objects, settling", self.report.count);
                self.mode = ScoreSeqMode::Settle {
                    until_ms: now_ms + scoring.settle_ms,
                    next: SettleNext::EarlyExit,
                };
                return None;
            }
        }

        if elapsed_ms > profile.timeout_ms {
            return Some(self.finish(ScoreOutcome::Timeout, now_ms, eng, dems));
        }

        None
    }

    /// Mode settle.
    ///
    /// A pause inside the sequence. Nothing is commanded until it ends.
    fn mode_settle(
        &mut self,
        profile: &EjectionProfile,
        until_ms: u64,
        next: SettleNext,
        input: &ConvInput,
        eng: &mut Engagement,
        dems: &mut MechDems,
    ) -> Option<MnvrCmd> {
        let expired = input.now_ms > until_ms;

        match next {
            SettleNext::HoldTop => {
                if expired {
                    dems.stop(&[ActId::FeedTop], BrakeMode::Hold);
                    self.mode = ScoreSeqMode::Run;
                }
                None
            }
            SettleNext::EarlyExit => {
                // Ends as soon as the counted object clears the gate, the settle time is only an
                // upper bound
                let cleared = profile
                    .scoring
                    .map(|s| s.count_gate.is_clear(input.middle_prox))
                    .unwrap_or(true);

                if expired || cleared {
                    Some(self.finish(ScoreOutcome::EarlyExit, input.now_ms, eng, dems))
                } else {
                    None
                }
            }
        }
    }

    fn step_gates(
        &mut self,
        gates: &GateSequence,
        scoring: Option<&ScoringWindow>,
        input: &ConvInput,
        elapsed_ms: u64,
        dems: &mut MechDems,
    ) {
        let rpt = &mut self.report;

        if !rpt.phase1 && gates.middle_detect.is_present(input.middle_prox) {
            debug!("Phase 1: object at the middle gate");
            rpt.phase1 = true;
        }

        if rpt.phase1
            && !rpt.phase2
            && gates.middle_clear.is_present(input.middle_prox)
            && elapsed_ms > gates.clear_min_ms
        {
            debug!("Phase 2: object cleared the middle gate");
            rpt.phase2 = true;

            if rpt.middle_target.is_none() {
                if let Some(speed) = gates.middle_speed_at_clear {
                    dems.set_speed(ActId::FeedMiddle, speed);
                }
            }

            if scoring.is_some() {
                rpt.scoring_since_ms = Some(input.now_ms);
            }
        }

        if rpt.phase2 && !rpt.phase3 && gates.top_detect.is_present(input.top_prox) {
            debug!("Phase 3: object at the top gate");

            if rpt.middle_target.is_none() {
                if let Some(speed) = gates.middle_speed_at_top {
                    dems.set_speed(ActId::FeedMiddle, speed);
                }
            }

            rpt.phase3 = true;
        }

        if rpt.phase2
            && rpt.middle_target.is_none()
            && gates.latch_gate.is_present(input.middle_prox)
            && elapsed_ms > gates.latch_min_ms
        {
            let target = input.middle_pos + gates.latch_offset;
            debug!("Middle stage latched on {:.1}", target);

            dems.stop(&[ActId::FeedMiddle], BrakeMode::Hold);
            rpt.middle_target = Some(target);
        }

        if let Some(target) = rpt.middle_target {
            let servo_allowed = match scoring {
                Some(s) => rpt
                    .scoring_since_ms
                    .map(|t| input.now_ms.saturating_sub(t) < s.servo_ms)
                    .unwrap_or(false),
                None => true,
            };

            if servo_allowed {
                dems.set_speed(
                    ActId::FeedMiddle,
                    gates.latch_servo.demand(input.middle_pos, target),
                );
            }
        }
    }

    fn step_scoring(&mut self, scoring: &ScoringWindow, input: &ConvInput, dems: &mut MechDems) {
        let rpt = &mut self.report;

        let since_ms = match rpt.scoring_since_ms {
            Some(t) => input.now_ms.saturating_sub(t),
            None => return,
        };

        if since_ms > scoring.servo_ms {
            set_feeders(scoring.eject, dems);
        }

        if rpt.phase3 && since_ms > scoring.count_delay_ms {
            if !rpt.count_gate_occupied && scoring.count_gate.is_present(input.middle_prox) {
                rpt.count_gate_occupied = true;
                rpt.count += 1;
                debug!("Counted object {}", rpt.count);
            } else if rpt.count_gate_occupied && scoring.count_gate.is_clear(input.middle_prox) {
                rpt.count_gate_occupied = false;
            }
        }
    }

    /// Common end of every sequence.
    fn finish(
        &mut self,
        outcome: ScoreOutcome,
        now_ms: u64,
        eng: &mut Engagement,
        dems: &mut MechDems,
    ) -> MnvrCmd {
        dems.stop(&[ActId::FeedTop], BrakeMode::Hold);
        dems.set_speed(ActId::FeedMiddle, 0.0);
        dems.set_speed(ActId::FeedTop, 0.0);

        eng.reset();

        intake::set_intake(dems, IntakeSpeed::Off);

        info!(
            "Scoring sequence finished after {} ms: {:?} ({} counted)",
            now_ms.saturating_sub(self.begin_ms),
            outcome,
            self.report.count
        );

        self.mode = ScoreSeqMode::Finished(outcome);

        MnvrCmd::Stop(BrakeMode::Coast)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn set_feeders(speeds: FeederSpeeds, dems: &mut MechDems) {
    dems.set_speed(ActId::FeedTop, speeds.top);
    dems.set_speed(ActId::FeedMiddle, speeds.middle);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conv_ctrl::StageLatch;

    fn input(now_ms: u64, top_prox: f64, middle_prox: f64) -> ConvInput {
        ConvInput {
            now_ms,
            top_prox,
            middle_prox,
            top_pos: 1000.0,
            middle_pos: 500.0,
        }
    }

    fn engaged() -> Engagement {
        Engagement {
            top: StageLatch::Engaged {
                since_ms: 0,
                target_pos: 870.0,
            },
            middle: StageLatch::Engaged {
                since_ms: 0,
                target_pos: 500.0,
            },
        }
    }

    /// Run a variant to completion with fixed sensor readings, returning the finishing tick.
    fn run_fixed(
        ss: &mut ScoreSeq,
        variant: u8,
        top_prox: f64,
        middle_prox: f64,
        eng: &mut Engagement,
    ) -> (u64, MechDems, Option<MnvrCmd>) {
        let mut dems = MechDems::new();
        ss.begin_sequence(variant, &input(0, top_prox, middle_prox), &mut dems)
            .unwrap();

        for now_ms in 1..5000 {
            let (cmd, _) = ss.proc(&input(now_ms, top_prox, middle_prox), eng, &mut dems);
            if ss.outcome().is_some() {
                return (now_ms, dems, cmd);
            }
        }

        panic!("Sequence {} never finished", variant);
    }

    #[test]
    fn test_begin() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut dems = MechDems::new();

        let creep = ss.begin_sequence(2, &input(0, 0.0, 0.0), &mut dems).unwrap();
        assert_eq!(
            creep,
            Some(MnvrCmd::Holonomic {
                fwd: 30.0,
                lat: 0.0,
                turn: 0.0
            })
        );
        assert_eq!(dems.speed.get(&ActId::FeedTop), Some(&-127.0));
        assert_eq!(dems.speed.get(&ActId::FeedMiddle), Some(&-96.0));
        assert_eq!(dems.speed.get(&ActId::IntakeL), Some(&0.0));
        assert_eq!(ss.mode(), ScoreSeqMode::Run);

        // Can't start a second one
        assert!(matches!(
            ss.begin_sequence(1, &input(0, 0.0, 0.0), &mut dems),
            Err(ScoreSeqError::AlreadyRunning)
        ));
    }

    #[test]
    fn test_unknown_variant() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut dems = MechDems::new();

        assert!(matches!(
            ss.begin_sequence(9, &input(0, 0.0, 0.0), &mut dems),
            Err(ScoreSeqError::UnknownVariant(9))
        ));
        assert!(dems.is_empty());
        assert_eq!(ss.mode(), ScoreSeqMode::Off);
    }

    #[test]
    fn test_timeout() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut eng = engaged();

        // Middle sensor never crosses its gate
        let (now_ms, dems, cmd) = run_fixed(&mut ss, 4, 0.0, 0.0, &mut eng);

        assert_eq!(now_ms, 601);
        assert_eq!(ss.end_sequence(), Some(ScoreOutcome::Timeout));
        assert_eq!(cmd, Some(MnvrCmd::Stop(BrakeMode::Coast)));
        assert_eq!(dems.brake.get(&ActId::FeedTop), Some(&BrakeMode::Hold));
        assert_eq!(dems.speed.get(&ActId::FeedTop), Some(&0.0));
        assert_eq!(dems.speed.get(&ActId::FeedMiddle), Some(&0.0));
        assert!(!eng.any_engaged());
        assert_eq!(ss.mode(), ScoreSeqMode::Off);
    }

    #[test]
    fn test_every_variant_resets() {
        for variant in 1..=5 {
            let mut ss = ScoreSeq::new(Params::default());
            let mut eng = engaged();

            let (_, dems, _) = run_fixed(&mut ss, variant, 0.0, 0.0, &mut eng);

            assert!(!eng.any_engaged(), "variant {}", variant);
            assert_eq!(dems.speed.get(&ActId::IntakeL), Some(&0.0));
            assert_eq!(dems.speed.get(&ActId::IntakeR), Some(&0.0));
            assert_eq!(dems.speed.get(&ActId::FeedTop), Some(&0.0));
            assert_eq!(dems.speed.get(&ActId::FeedMiddle), Some(&0.0));
        }
    }

    #[test]
    fn test_hold_on_detect() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut eng = Engagement::default();
        let mut dems = MechDems::new();

        ss.begin_sequence(5, &input(0, 0.0, 0.0), &mut dems).unwrap();

        // Object arrives, middle holds and the settle starts
        let mut dems = MechDems::new();
        ss.proc(&input(10, 0.0, 1800.0), &mut eng, &mut dems);
        assert_eq!(dems.brake.get(&ActId::FeedMiddle), Some(&BrakeMode::Hold));
        assert!(dems.brake.get(&ActId::FeedTop).is_none());
        assert_eq!(
            ss.mode(),
            ScoreSeqMode::Settle {
                until_ms: 260,
                next: SettleNext::HoldTop
            }
        );

        // Top holds once the settle is over
        let mut dems = MechDems::new();
        ss.proc(&input(260, 0.0, 1800.0), &mut eng, &mut dems);
        assert!(dems.is_empty());
        ss.proc(&input(261, 0.0, 1800.0), &mut eng, &mut dems);
        assert_eq!(dems.brake.get(&ActId::FeedTop), Some(&BrakeMode::Hold));
        assert_eq!(ss.mode(), ScoreSeqMode::Run);

        // Only once
        let mut dems = MechDems::new();
        ss.proc(&input(262, 0.0, 1800.0), &mut eng, &mut dems);
        assert!(dems.brake.is_empty());
        assert!(ss.proc(&input(262, 0.0, 1800.0), &mut eng, &mut dems).1.held);
    }

    #[test]
    fn test_hold_min_time() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut eng = Engagement::default();
        let mut dems = MechDems::new();

        ss.begin_sequence(4, &input(0, 0.0, 0.0), &mut dems).unwrap();

        let mut dems = MechDems::new();
        ss.proc(&input(150, 0.0, 1800.0), &mut eng, &mut dems);
        assert!(dems.brake.is_empty());

        ss.proc(&input(151, 0.0, 1800.0), &mut eng, &mut dems);
        assert_eq!(dems.brake.get(&ActId::FeedMiddle), Some(&BrakeMode::Hold));
        assert_eq!(dems.brake.get(&ActId::FeedTop), Some(&BrakeMode::Hold));
    }

    #[test]
    fn test_gates_and_latch() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut eng = Engagement::default();
        let mut dems = MechDems::new();

        ss.begin_sequence(1, &input(0, 0.0, 0.0), &mut dems).unwrap();

        // Phase 1
        let (_, rpt) = ss.proc(&input(10, 0.0, 1900.0), &mut eng, &mut dems);
        assert!(rpt.phase1 && !rpt.phase2);

        // Clear too early is ignored
        let (_, rpt) = ss.proc(&input(100, 0.0, 1000.0), &mut eng, &mut dems);
        assert!(!rpt.phase2);

        // Phase 2 slows the middle
        let mut dems = MechDems::new();
        let (_, rpt) = ss.proc(&input(201, 0.0, 1000.0), &mut eng, &mut dems);
        assert!(rpt.phase2);
        assert!((dems.speed[&ActId::FeedMiddle] + 127.0 / 1.8).abs() < 1e-9);

        // Phase 3
        let (_, rpt) = ss.proc(&input(210, 200.0, 1000.0), &mut eng, &mut dems);
        assert!(rpt.phase3);

        // Next object latches the middle, then the bang bang servo drives towards the target
        let mut dems = MechDems::new();
        let (_, rpt) = ss.proc(&input(220, 200.0, 1700.0), &mut eng, &mut dems);
        assert_eq!(rpt.middle_target, Some(730.0));
        assert_eq!(dems.brake.get(&ActId::FeedMiddle), Some(&BrakeMode::Hold));
        assert_eq!(dems.speed.get(&ActId::FeedMiddle), Some(&127.0));
    }

    #[test]
    fn test_early_exit() {
        let mut ss = ScoreSeq::new(Params::default());
        let mut eng = engaged();
        let mut dems = MechDems::new();

        let creep = ss.begin_sequence(3, &input(0, 0.0, 0.0), &mut dems).unwrap();
        assert!(creep.is_none());

        // Object moves through the gates, scoring starts at 201
        ss.proc(&input(10, 0.0, 1900.0), &mut eng, &mut dems);
        ss.proc(&input(201, 0.0, 1000.0), &mut eng, &mut dems);
        ss.proc(&input(210, 200.0, 1000.0), &mut eng, &mut dems);

        // Ejection speeds after the servo window
        let mut dems = MechDems::new();
        ss.proc(&input(702, 200.0, 1000.0), &mut eng, &mut dems);
        assert_eq!(dems.speed.get(&ActId::FeedTop), Some(&127.0));
        assert_eq!(dems.speed.get(&ActId::FeedMiddle), Some(&-127.0));

        // Count two objects past the counting gate
        let readings = [1800.0, 1800.0, 1000.0, 1800.0];
        let mut now_ms = 760;
        for prox in readings.iter() {
            ss.proc(&input(now_ms, 200.0, *prox), &mut eng, &mut dems);
            now_ms += 1;
        }
        assert_eq!(
            ss.mode(),
            ScoreSeqMode::Settle {
                until_ms: 763 + 60,
                next: SettleNext::EarlyExit
            }
        );

        // Still occupied so the settle carries on, then clears
        let (cmd, _) = ss.proc(&input(770, 200.0, 1800.0), &mut eng, &mut dems);
        assert!(cmd.is_none());
        let (cmd, rpt) = ss.proc(&input(771, 200.0, 1600.0), &mut eng, &mut dems);
        assert_eq!(cmd, Some(MnvrCmd::Stop(BrakeMode::Coast)));
        assert_eq!(rpt.count, 2);
        assert_eq!(ss.outcome(), Some(ScoreOutcome::EarlyExit));
        assert!(!eng.any_engaged());
    }
}
