//! Main vehicle-side executable entry point.
//!
//! # Architecture
//!
//! The executable runs a mission script against the simulated vehicle:
//!
//!     - Load parameters
//!     - Initialise the session and logging
//!     - Initialise the simulated equipment and all modules
//!     - For each step of the script:
//!         - Execute the step's command, which blocks until it completes
//!         - Log the outcome and the vehicle state
//!     - Every tick is archived to `ticks.csv` in the session directory
//!
//! Each command runs its own tick loop, see the `mission` module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info};
use std::{env, fs};

// Internal
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    script_interpreter::MissionScript,
    session::Session,
};
use veh_lib::{
    conv_ctrl,
    loco_ctrl,
    mission::{self, MissionExec},
    params::VehExecParams,
    score_seq,
    sim::SimVehicle,
    traj_ctrl,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let exec_params: VehExecParams =
        util::params::load("veh_exec.toml").wrap_err("Could not load exec params")?;

    let log_level: LevelFilter = exec_params
        .log_level
        .parse()
        .map_err(|_| eyre!("Invalid log level \"{}\"", exec_params.log_level))?;

    // Initialise session
    let session = Session::new("veh_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Omni Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected a single argument, the path to the mission script, found {}",
            args.len() - 1
        ));
    }

    let mut script = MissionScript::new(&args[1]).wrap_err("Failed to load script")?;

    if let Some(path) = script.get_path() {
        info!("Loaded script from {:?}", path);
    }
    info!("Script contains {} steps\n", script.get_num_steps());

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let params = mission::Params {
        loco_ctrl: util::params::load::<loco_ctrl::Params>("loco_ctrl.toml")
            .wrap_err("Failed to load LocoCtrl params")?,
        traj_ctrl: util::params::load::<traj_ctrl::Params>("traj_ctrl.toml")
            .wrap_err("Failed to load TrajCtrl params")?,
        conv_ctrl: util::params::load::<conv_ctrl::Params>("conv_ctrl.toml")
            .wrap_err("Failed to load ConvCtrl params")?,
        score_seq: util::params::load::<score_seq::Params>("score_seq.toml")
            .wrap_err("Failed to load ScoreSeq params")?,
        act_limits: exec_params.act_limits,
    };

    let sim = SimVehicle::init("sim.toml").wrap_err("Failed to initialise the simulation")?;

    let mut exec = MissionExec::new(sim, params);
    exec.set_archiver(
        Archiver::from_session(&session, "ticks.csv")
            .wrap_err("Failed to create the tick archive")?,
    );

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining mission");

    while let Some(step) = script.next_step() {
        info!("Step {}: {:?}", step.number, step.cmd);

        let outcome = exec
            .exec(&step.cmd)
            .wrap_err_with(|| format!("Failed to execute step {}", step.number))?;

        info!("Step {} complete: {:?}", step.number, outcome);
        debug!(
            "Vehicle state: {}",
            serde_json::to_string(&exec.snapshot()).wrap_err("Failed to serialise the state")?
        );
    }

    let pose = exec.pose();
    info!(
        "Mission complete, final pose ({:.1}, {:.1}) @ {:.1} deg",
        pose.x(),
        pose.y(),
        pose.heading_deg
    );

    // Save the final state alongside the log
    let final_state_path = session.file_path("final_state.json");
    fs::write(
        &final_state_path,
        serde_json::to_string_pretty(&exec.snapshot())
            .wrap_err("Failed to serialise the final state")?,
    )
    .wrap_err("Failed to save the final state")?;
    info!("Final state saved to {:?}", final_state_path);

    Ok(())
}
