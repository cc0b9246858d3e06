//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{loc::Pose, loco_ctrl::MnvrCmd};
use veh_if::{eqpt::BrakeMode, mission::Goal};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TrajCtrl {
    params: Params,

    /// Executing mode
    mode: TrajCtrlMode,

    /// The goal currently being driven to
    goal: Option<Goal>,

    /// Time the current goal was started at
    begin_ms: u64,

    contact: ContactMonitor,

    output_mnvr_cmd: Option<MnvrCmd>,
    report: StatusReport
}

/// The status report containing the controller quantities of the last tick.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance to the goal position
    pub dist: f64,

    /// Field frame bearing to the goal position
    pub bearing_deg: f64,

    /// Forward translation demand
    pub fwd_dem: f64,

    /// Lateral translation demand
    pub lat_dem: f64,

    /// Signed error to the goal heading
    pub turn_error_deg: f64,

    /// Turn demand
    pub turn_dem: f64,

    /// True if the heading is within the goal's tolerance band
    pub in_band: bool,

    /// Number of consecutive contact samples
    pub contact_count: u32
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    /// A goal is already being executed. This error occurs when attempting to start a new goal
    /// before the current one has finished.
    #[error("Attempted to begin a goal while one is already being executed")]
    GoalAlreadyLoaded,

    #[error("The goal is invalid: {0}")]
    InvalidGoal(String),

    /// Attempted to drive without a goal.
    #[error("No goal has been set")]
    NoGoal
}

/// How a goal finished.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum DriveOutcome {
    /// Position and heading are within tolerance
    ReachedGoal,

    /// The contact sensor stopped the vehicle early
    SensorTriggeredStop,

    /// The diagnostic timeout expired
    TimedOut
}

/// The possible modes of execution of TrajCtrl. Each mode is handled by a `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrajCtrlMode {
    Off,
    Drive,
    BackOff { until_ms: u64 },
    Finished(DriveOutcome)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            mode: TrajCtrlMode::Off,
            goal: None,
            begin_ms: 0,
            contact: ContactMonitor::default(),
            output_mnvr_cmd: None,
            report: StatusReport::default()
        }
    }

    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    /// The outcome of the current goal, or `None` if it's still executing or there is no goal.
    pub fn outcome(&self) -> Option<DriveOutcome> {
        match self.mode {
            TrajCtrlMode::Finished(o) => Some(o),
            _ => None
        }
    }

    /// Begin driving to a new goal.
    ///
    /// Execution begins on the next call to `proc`. If the pose already satisfies the goal the
    /// module goes straight to `Finished(ReachedGoal)` without producing any command.
    ///
    /// Beginning a new goal before the current one has finished is an error. A finished goal must
    /// be cleared with `end_goal` first.
    pub fn begin_goal(
        &mut self,
        goal: Goal,
        pose: &Pose,
        now_ms: u64
    ) -> Result<(), TrajCtrlError> {

        if self.mode != TrajCtrlMode::Off {
            return Err(TrajCtrlError::GoalAlreadyLoaded)
        }

        validate_goal(&goal)?;

        info!(
            "Begining goal ({:.1}, {:.1}) @ {:.1} deg from ({:.1}, {:.1}) @ {:.1} deg",
            goal.x, goal.y, goal.heading_deg,
            pose.x(), pose.y(), pose.heading_deg
        );

        self.goal = Some(goal);
        self.begin_ms = now_ms;
        self.contact = ContactMonitor::default();

        self.mode = if goal_reached(pose, &goal) {
            info!("Goal already satisfied");
            TrajCtrlMode::Finished(DriveOutcome::ReachedGoal)
        }
        else {
            TrajCtrlMode::Drive
        };

        Ok(())
    }

    /// Clear the current goal, returning its outcome if it had finished.
    pub fn end_goal(&mut self) -> Option<DriveOutcome> {
        let outcome = self.outcome();

        self.goal = None;
        self.mode = TrajCtrlMode::Off;

        outcome
    }

    /// Process trajectory control.
    ///
    /// `contact_value` is the raw contact sensor reading of this tick.
    pub fn proc(
        &mut self,
        pose: &Pose,
        contact_value: f64,
        now_ms: u64
    ) -> Result<(Option<MnvrCmd>, StatusReport), TrajCtrlError> {

        // Setup cycle data
        self.output_mnvr_cmd = None;
        self.report = StatusReport::default();

        match self.mode {
            TrajCtrlMode::Off => (),
            TrajCtrlMode::Drive => self.mode_drive(pose, contact_value, now_ms)?,
            TrajCtrlMode::BackOff { until_ms } => self.mode_back_off(until_ms, now_ms),
            TrajCtrlMode::Finished(_) => ()
        };

        Ok((self.output_mnvr_cmd, self.report))
    }

    /// Mode drive.
    ///
    /// Computes the holonomic demand towards the goal and checks for the finishing conditions.
    fn mode_drive(
        &mut self,
        pose: &Pose,
        contact_value: f64,
        now_ms: u64
    ) -> Result<(), TrajCtrlError> {

        let goal = self.goal.ok_or(TrajCtrlError::NoGoal)?;

        let (fwd, lat) = translation_demand(pose, &goal, &self.params, &mut self.report);
        let turn = turn_demand(pose.heading_deg, &goal, &self.params, &mut self.report);

        // ---- TERMINATION ----

        if let Some(timeout_ms) = self.params.diag_timeout_ms {
            if now_ms.saturating_sub(self.begin_ms) >= timeout_ms {
                warn!("Goal timed out after {} ms", timeout_ms);
                self.output_mnvr_cmd = Some(MnvrCmd::Stop(BrakeMode::Hold));
                self.mode = TrajCtrlMode::Finished(DriveOutcome::TimedOut);
                return Ok(())
            }
        }

        if goal_reached(pose, &goal) {
            info!(
                "Goal reached at ({:.1}, {:.1}) @ {:.1} deg",
                pose.x(), pose.y(), pose.heading_deg
            );
            self.mode = TrajCtrlMode::Finished(DriveOutcome::ReachedGoal);
            return Ok(())
        }

        // ---- COMMAND GENERATION ----

        self.output_mnvr_cmd = Some(MnvrCmd::Holonomic { fwd, lat, turn });

        // ---- CONTACT ----

        let present = self.params.contact.is_present(contact_value);
        let count = self.contact.sample(
            present,
            now_ms,
            self.params.contact_sample_spacing_ms
        );
        self.report.contact_count = count;

        if present && goal.stop_on_contact && count >= self.params.contact_sample_count {
            if self.is_back_off_goal(&goal) {
                if pose.x() > self.params.back_off_min_x {
                    debug!("Contact on back off goal, backing off");
                    self.output_mnvr_cmd = Some(MnvrCmd::Holonomic {
                        fwd: -self.params.back_off_speed,
                        lat: 0.0,
                        turn: 0.0
                    });
                    self.mode = TrajCtrlMode::BackOff {
                        until_ms: now_ms + self.params.back_off_duration_ms
                    };
                }
            }
            else {
                info!("Contact, stopping");
                self.output_mnvr_cmd = Some(MnvrCmd::Stop(BrakeMode::Hold));
                self.mode = TrajCtrlMode::Finished(DriveOutcome::SensorTriggeredStop);
            }
        }

        Ok(())
    }

    /// Mode back off.
    ///
    /// The wheels keep the reverse demand until the back off time has passed, then coast.
    fn mode_back_off(&mut self, until_ms: u64, now_ms: u64) {
        if now_ms > until_ms {
            info!("Back off complete");
            self.output_mnvr_cmd = Some(MnvrCmd::Stop(BrakeMode::Coast));
            self.mode = TrajCtrlMode::Finished(DriveOutcome::SensorTriggeredStop);
        }
    }

    fn is_back_off_goal(&self, goal: &Goal) -> bool {
        (goal.heading_deg - self.params.back_off_heading_deg).abs() < 1e-9
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check that a goal contains only usable values.
fn validate_goal(goal: &Goal) -> Result<(), TrajCtrlError> {
    for (name, value) in [("x", goal.x), ("y", goal.y), ("heading", goal.heading_deg)].iter() {
        if !value.is_finite() {
            return Err(TrajCtrlError::InvalidGoal(format!("{} is {}", name, value)))
        }
    }

    for (name, value) in [
        ("move speed", goal.move_speed),
        ("turn speed", goal.turn_speed),
        ("position tolerance", goal.position_tolerance),
        ("angle tolerance", goal.angle_tolerance)
    ].iter() {
        if !value.is_finite() || *value < 0.0 {
            return Err(TrajCtrlError::InvalidGoal(format!("{} is {}", name, value)))
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn far_goal() -> Goal {
        let mut goal = Goal::new(0.0, 5000.0, 0.0);
        goal.stop_on_contact = true;
        goal
    }

    #[test]
    fn test_begin_goal() {
        let mut tc = TrajCtrl::new(Params::default());
        let pose = Pose::default();

        // Already satisfied
        tc.begin_goal(Goal::new(0.0, 50.0, 3.0), &pose, 0).unwrap();
        assert_eq!(tc.outcome(), Some(DriveOutcome::ReachedGoal));

        let (cmd, _) = tc.proc(&pose, 2000.0, 1).unwrap();
        assert!(cmd.is_none());

        // Can't begin again until ended
        assert!(matches!(
            tc.begin_goal(far_goal(), &pose, 0),
            Err(TrajCtrlError::GoalAlreadyLoaded)
        ));
        assert_eq!(tc.end_goal(), Some(DriveOutcome::ReachedGoal));
        assert_eq!(tc.mode(), TrajCtrlMode::Off);

        // Invalid goals
        let mut goal = far_goal();
        goal.position_tolerance = -1.0;
        assert!(matches!(
            tc.begin_goal(goal, &pose, 0),
            Err(TrajCtrlError::InvalidGoal(_))
        ));
        let mut goal = far_goal();
        goal.x = f64::NAN;
        assert!(matches!(
            tc.begin_goal(goal, &pose, 0),
            Err(TrajCtrlError::InvalidGoal(_))
        ));
    }

    #[test]
    fn test_contact_stop() {
        let mut tc = TrajCtrl::new(Params::default());
        let pose = Pose::default();

        tc.begin_goal(far_goal(), &pose, 0).unwrap();

        let mut now_ms = 0;
        let mut outcome = None;
        let mut last_cmd = None;

        while outcome.is_none() && now_ms < 1000 {
            let (cmd, _) = tc.proc(&pose, 1200.0, now_ms).unwrap();
            last_cmd = cmd;
            outcome = tc.outcome();
            now_ms += 1;
        }

        assert_eq!(outcome, Some(DriveOutcome::SensorTriggeredStop));
        assert_eq!(last_cmd, Some(MnvrCmd::Stop(BrakeMode::Hold)));

        // Four samples spaced by more than 10 ms, the first one immediate
        assert_eq!(now_ms, 34);
    }

    #[test]
    fn test_contact_ignored() {
        let mut tc = TrajCtrl::new(Params::default());
        let pose = Pose::default();

        let mut goal = far_goal();
        goal.stop_on_contact = false;
        tc.begin_goal(goal, &pose, 0).unwrap();

        for now_ms in 0..200 {
            let (cmd, _) = tc.proc(&pose, 1200.0, now_ms).unwrap();
            assert!(matches!(cmd, Some(MnvrCmd::Holonomic { .. })));
        }
        assert_eq!(tc.outcome(), None);
    }

    #[test]
    fn test_back_off() {
        let params = Params::default();
        let mut tc = TrajCtrl::new(params.clone());

        let mut goal = Goal::new(2000.0, 0.0, params.back_off_heading_deg);
        goal.stop_on_contact = true;

        // Before the x gate the contact does nothing
        let pose = Pose::new(800.0, 0.0, 92.0);
        tc.begin_goal(goal, &pose, 0).unwrap();
        for now_ms in 0..100 {
            tc.proc(&pose, 1200.0, now_ms).unwrap();
        }
        assert_eq!(tc.mode(), TrajCtrlMode::Drive);
        tc.end_goal();

        // After the gate it backs off and then coasts
        let pose = Pose::new(900.0, 0.0, 92.0);
        tc.begin_goal(goal, &pose, 0).unwrap();

        let mut now_ms = 0;
        let mut back_off_cmd = None;
        while tc.mode() == TrajCtrlMode::Drive {
            back_off_cmd = tc.proc(&pose, 1200.0, now_ms).unwrap().0;
            now_ms += 1;
        }
        assert_eq!(
            back_off_cmd,
            Some(MnvrCmd::Holonomic { fwd: -80.0, lat: 0.0, turn: 0.0 })
        );
        assert_eq!(tc.mode(), TrajCtrlMode::BackOff { until_ms: 33 + 75 });

        let mut last_cmd = None;
        while tc.outcome().is_none() {
            let (cmd, _) = tc.proc(&pose, 1200.0, now_ms).unwrap();
            if cmd.is_some() {
                last_cmd = cmd;
            }
            now_ms += 1;
        }
        assert_eq!(last_cmd, Some(MnvrCmd::Stop(BrakeMode::Coast)));
        assert_eq!(tc.outcome(), Some(DriveOutcome::SensorTriggeredStop));
        assert_eq!(now_ms, 33 + 75 + 2);
    }

    #[test]
    fn test_diag_timeout() {
        let mut params = Params::default();
        params.diag_timeout_ms = Some(50);
        let mut tc = TrajCtrl::new(params);
        let pose = Pose::default();

        tc.begin_goal(Goal::new(0.0, 5000.0, 0.0), &pose, 10).unwrap();

        let mut now_ms = 10;
        while tc.outcome().is_none() {
            tc.proc(&pose, 2000.0, now_ms).unwrap();
            now_ms += 1;
        }

        assert_eq!(tc.outcome(), Some(DriveOutcome::TimedOut));
        assert_eq!(now_ms, 61);
    }
}
