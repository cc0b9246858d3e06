//! # Data Store

use serde::Serialize;

use crate::{
    conv_ctrl::{self, Engagement, StageState},
    loc::{LocMgr, Pose},
    loco_ctrl, score_seq, traj_ctrl,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Holds everything which must outlive a single mission command.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of ticks already executed
    pub num_ticks: u64,

    // Localisation
    pub loc: LocMgr,

    // Conveyance
    /// Engagement of the conveyance stages, kept between drive segments
    pub engagement: Engagement,

    // Status reports of the last tick
    pub loco_ctrl_status_rpt: loco_ctrl::StatusReport,
    pub traj_ctrl_status_rpt: traj_ctrl::StatusReport,
    pub conv_ctrl_status_rpt: conv_ctrl::StatusReport,
    pub score_seq_status_rpt: score_seq::StatusReport,
}

/// Snapshot of the vehicle state, logged at the end of every command.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Snapshot {
    pub num_ticks: u64,
    pub pose: Pose,
    pub engagement: Engagement,
    pub loco_ctrl: loco_ctrl::StatusReport,
    pub traj_ctrl: traj_ctrl::StatusReport,
    pub conv_ctrl: conv_ctrl::StatusReport,
    pub score_seq: score_seq::StatusReport,
}

/// One row of the tick archive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time_ms: u64,

    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,

    pub dist: f64,
    pub bearing_deg: f64,
    pub fwd_dem: f64,
    pub lat_dem: f64,
    pub turn_error_deg: f64,
    pub turn_dem: f64,
    pub in_band: bool,
    pub contact_count: u32,

    /// Number of wheels whose demand was limited
    pub num_drv_limited: usize,
    pub invalid_cmd: bool,

    pub top: StageState,
    pub middle: StageState,

    pub middle_target: Option<f64>,
    pub count: u32,
    pub held: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a tick.
    pub fn tick_start(&mut self) {
        self.num_ticks += 1;

        self.loco_ctrl_status_rpt = loco_ctrl::StatusReport::default();
        self.traj_ctrl_status_rpt = traj_ctrl::StatusReport::default();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            num_ticks: self.num_ticks,
            pose: self.loc.pose(),
            engagement: self.engagement,
            loco_ctrl: self.loco_ctrl_status_rpt,
            traj_ctrl: self.traj_ctrl_status_rpt,
            conv_ctrl: self.conv_ctrl_status_rpt,
            score_seq: self.score_seq_status_rpt,
        }
    }

    /// Flatten the state of the current tick into an archive row.
    pub fn tick_record(&self, time_ms: u64) -> TickRecord {
        let pose = self.loc.pose();
        let traj = &self.traj_ctrl_status_rpt;
        let loco = &self.loco_ctrl_status_rpt;

        TickRecord {
            tick: self.num_ticks,
            time_ms,
            x: pose.x(),
            y: pose.y(),
            heading_deg: pose.heading_deg,
            dist: traj.dist,
            bearing_deg: traj.bearing_deg,
            fwd_dem: traj.fwd_dem,
            lat_dem: traj.lat_dem,
            turn_error_deg: traj.turn_error_deg,
            turn_dem: traj.turn_dem,
            in_band: traj.in_band,
            contact_count: traj.contact_count,
            num_drv_limited: loco.drv_speed_limited.iter().filter(|l| **l).count(),
            invalid_cmd: loco.invalid_cmd,
            top: self.conv_ctrl_status_rpt.top,
            middle: self.conv_ctrl_status_rpt.middle,
            middle_target: self.score_seq_status_rpt.middle_target,
            count: self.score_seq_status_rpt.count,
            held: self.score_seq_status_rpt.held,
        }
    }
}
