//! # Mission execution module
//!
//! [`MissionExec`] is the public surface of the control core. It owns the vehicle equipment, the
//! [`DataStore`] context and every controller, and runs one blocking operation at a time:
//!
//! - `drive_to` - drive to a goal while running the conveyance
//! - `score_and_store` - run one ejection variant of the scoring sequencer
//! - `set_intake`, `set_feeders`, `stop_drive` - one off actuator commands
//! - `wait` - keep ticking for a fixed time
//!
//! Every tick of every operation follows the same order: read the inputs, step the conveyance or
//! the sequencer, update the pose, step trajectory control, then write the merged actuator
//! demands, archive the tick and wait for the next tick. The pose is updated on every tick of
//! every operation, waits and settles included.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;
use util::archive::Archiver;
use veh_if::{
    eqpt::{ActId, ActLimits, BrakeMode, Eqpt, MechDems, ProxId},
    mission::{Goal, IntakeSpeed, MissionCmd},
};

use crate::{
    conv_ctrl::{self, ConvCtrl, ConvInput, Engagement},
    data_store::{DataStore, Snapshot},
    intake,
    loc::Pose,
    loco_ctrl::{self, LocoCtrl, MnvrCmd},
    score_seq::{self, ScoreOutcome, ScoreSeq, ScoreSeqError},
    traj_ctrl::{self, DriveOutcome, TrajCtrl, TrajCtrlError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of every module run by the mission executor.
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub loco_ctrl: loco_ctrl::Params,
    pub traj_ctrl: traj_ctrl::Params,
    pub conv_ctrl: conv_ctrl::Params,
    pub score_seq: score_seq::Params,
    pub act_limits: ActLimits,
}

/// Runs mission commands on the vehicle.
pub struct MissionExec<E: Eqpt> {
    eqpt: E,

    ds: DataStore,

    loco_ctrl: LocoCtrl,
    traj_ctrl: TrajCtrl,
    conv_ctrl: ConvCtrl,
    score_seq: ScoreSeq,

    act_limits: ActLimits,

    /// Per tick archive, if one has been set
    arch_ticks: Option<Archiver>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Trajectory control error: {0}")]
    TrajCtrlError(#[from] TrajCtrlError),

    #[error("Scoring sequencer error: {0}")]
    ScoreSeqError(#[from] ScoreSeqError),
}

/// Result of a single mission command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum CmdOutcome {
    Drive(DriveOutcome),
    Score(ScoreOutcome),

    /// The command has no outcome beyond having been executed
    Done,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: Eqpt> MissionExec<E> {
    pub fn new(eqpt: E, params: Params) -> Self {
        Self {
            eqpt,
            ds: DataStore::default(),
            loco_ctrl: LocoCtrl::new(params.loco_ctrl),
            traj_ctrl: TrajCtrl::new(params.traj_ctrl),
            conv_ctrl: ConvCtrl::new(params.conv_ctrl),
            score_seq: ScoreSeq::new(params.score_seq),
            act_limits: params.act_limits,
            arch_ticks: None,
        }
    }

    /// Archive the state of every tick from now on.
    pub fn set_archiver(&mut self, archiver: Archiver) {
        self.arch_ticks = Some(archiver);
    }

    pub fn eqpt(&self) -> &E {
        &self.eqpt
    }

    pub fn pose(&self) -> Pose {
        self.ds.loc.pose()
    }

    pub fn engagement(&self) -> Engagement {
        self.ds.engagement
    }

    pub fn snapshot(&self) -> Snapshot {
        self.ds.snapshot()
    }

    /// Execute a single mission command.
    pub fn exec(&mut self, cmd: &MissionCmd) -> Result<CmdOutcome, MissionError> {
        debug!("Executing {:?}", cmd);

        let outcome = match *cmd {
            MissionCmd::Drive(goal) => CmdOutcome::Drive(self.drive_to(goal)?),
            MissionCmd::Score { variant } => CmdOutcome::Score(self.score_and_store(variant)?),
            MissionCmd::Intake(speed) => {
                self.set_intake(speed);
                CmdOutcome::Done
            }
            MissionCmd::Feeders { top, middle } => {
                self.set_feeders(top, middle);
                CmdOutcome::Done
            }
            MissionCmd::StopDrive(mode) => {
                self.stop_drive(mode);
                CmdOutcome::Done
            }
            MissionCmd::Wait { ms } => {
                self.wait(ms);
                CmdOutcome::Done
            }
        };

        Ok(outcome)
    }

    /// Drive to the goal, running the conveyance on every tick.
    ///
    /// Blocks until the goal is reached, the contact sensor stops the vehicle or the diagnostic
    /// timeout (if enabled) expires. There is no other way out: a goal which can never be
    /// satisfied keeps the vehicle driving forever.
    pub fn drive_to(&mut self, goal: Goal) -> Result<DriveOutcome, MissionError> {
        let now_ms = self.eqpt.now_ms();

        self.traj_ctrl.begin_goal(goal, &self.ds.loc.pose(), now_ms)?;

        let mut dems = MechDems::new();
        let input = ConvInput::read(&self.eqpt, now_ms);
        self.conv_ctrl
            .begin_segment(&goal, &input, &mut self.ds.engagement, &mut dems);
        self.apply(dems);

        let outcome = loop {
            if let Some(outcome) = self.traj_ctrl.outcome() {
                break outcome;
            }

            self.ds.tick_start();
            let now_ms = self.eqpt.now_ms();
            let mut dems = MechDems::new();

            // ---- CONVEYANCE ----

            let input = ConvInput::read(&self.eqpt, now_ms);
            self.conv_ctrl
                .step(&input, &mut self.ds.engagement, &mut dems);
            self.ds.conv_ctrl_status_rpt = self.conv_ctrl.report();

            // ---- LOCALISATION ----

            self.ds.loc.update_from(&self.eqpt);

            // ---- TRAJECTORY CONTROL ----

            let (mnvr_cmd, rpt) = self.traj_ctrl.proc(
                &self.ds.loc.pose(),
                self.eqpt.proximity(ProxId::Contact),
                now_ms,
            )?;
            self.ds.traj_ctrl_status_rpt = rpt;

            if let Some(ref cmd) = mnvr_cmd {
                dems.merge(self.loco(cmd));
            }

            self.apply(dems);
            self.end_tick(now_ms);
        };

        self.traj_ctrl.end_goal();

        let mut dems = MechDems::new();
        self.conv_ctrl.end_segment(&mut dems);
        self.ds.conv_ctrl_status_rpt = self.conv_ctrl.report();
        self.apply(dems);

        info!("Drive finished: {:?}", outcome);

        Ok(outcome)
    }

    /// Run the scoring sequence of the given variant.
    ///
    /// Ends with the engagement of both conveyance stages cleared and the intake stopped.
    pub fn score_and_store(&mut self, variant: u8) -> Result<ScoreOutcome, MissionError> {
        let now_ms = self.eqpt.now_ms();

        let mut dems = MechDems::new();
        let input = ConvInput::read(&self.eqpt, now_ms);
        let creep = self.score_seq.begin_sequence(variant, &input, &mut dems)?;
        if let Some(ref cmd) = creep {
            dems.merge(self.loco(cmd));
        }
        self.apply(dems);

        let outcome = loop {
            if let Some(outcome) = self.score_seq.outcome() {
                break outcome;
            }

            self.ds.tick_start();
            let now_ms = self.eqpt.now_ms();
            let mut dems = MechDems::new();

            let input = ConvInput::read(&self.eqpt, now_ms);
            let (mnvr_cmd, rpt) = self
                .score_seq
                .proc(&input, &mut self.ds.engagement, &mut dems);
            self.ds.score_seq_status_rpt = rpt;

            self.ds.loc.update_from(&self.eqpt);

            if let Some(ref cmd) = mnvr_cmd {
                dems.merge(self.loco(cmd));
            }

            self.apply(dems);
            self.end_tick(now_ms);
        };

        self.score_seq.end_sequence();

        Ok(outcome)
    }

    /// Set both intake rollers.
    pub fn set_intake(&mut self, speed: IntakeSpeed) {
        let mut dems = MechDems::new();
        intake::set_intake(&mut dems, speed);
        self.apply(dems);
    }

    /// Set both feeder stages to fixed speeds.
    pub fn set_feeders(&mut self, top: f64, middle: f64) {
        let mut dems = MechDems::new();
        dems.set_speed(ActId::FeedTop, top);
        dems.set_speed(ActId::FeedMiddle, middle);
        self.apply(dems);
    }

    /// Stop all drive wheels.
    pub fn stop_drive(&mut self, mode: BrakeMode) {
        let dems = self.loco(&MnvrCmd::Stop(mode));
        self.apply(dems);
    }

    /// Clear the engagement of both conveyance stages, before a new storing segment.
    pub fn reset_conveyance(&mut self) {
        self.ds.engagement.reset();
    }

    /// Keep ticking for the given time, updating the pose only.
    pub fn wait(&mut self, duration_ms: u64) {
        let end_ms = self.eqpt.now_ms() + duration_ms;

        while self.eqpt.now_ms() < end_ms {
            self.ds.tick_start();
            let now_ms = self.eqpt.now_ms();
            self.ds.loc.update_from(&self.eqpt);
            self.end_tick(now_ms);
        }
    }

    /// Archive the tick then wait for the next one.
    fn end_tick(&mut self, now_ms: u64) {
        let arch_err = match self.arch_ticks {
            Some(ref mut arch) => arch.serialise(self.ds.tick_record(now_ms)).err(),
            None => None,
        };

        if let Some(e) = arch_err {
            warn!("Tick archiving stopped: {}", e);
            self.arch_ticks = None;
        }

        self.eqpt.wait_tick();
    }

    fn loco(&mut self, cmd: &MnvrCmd) -> MechDems {
        let (dems, rpt) = self.loco_ctrl.proc(cmd);
        self.ds.loco_ctrl_status_rpt = rpt;
        dems
    }

    fn apply(&mut self, dems: MechDems) {
        dems.apply(&mut self.eqpt, &self.act_limits);
    }
}
