//! # Mission script interpreter module
//!
//! This module provides an interpreter for mission scripts, which list the commands the vehicle
//! shall execute in order. Each line of a script has the form
//!
//! ```text
//! <step>: <json mission command>;
//! ```
//!
//! where step numbers are integers that must strictly increase through the script.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use veh_if::mission::{MissionCmd, MissionCmdParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command at a specific step of the script.
#[derive(Debug, Clone)]
pub struct Step {
    /// The step number of the command
    pub number: u64,

    /// The command to run
    pub cmd: MissionCmd
}

/// A loaded mission script.
///
/// After loading use `.next_step` to pop the commands in the order they shall be executed.
#[derive(Debug)]
pub struct MissionScript {
    script_path: Option<PathBuf>,
    steps: VecDeque<Step>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid step number: {0}. Should be an integer (like 1)")]
    InvalidStep(String),

    #[error("Script step {0} does not come after the previous step {1}")]
    NonIncreasingStep(u64, u64),

    #[error("Script contains an invalid command at step {0}: {1}")]
    InvalidCmd(u64, MissionCmdParseError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionScript {

    /// Load a script from the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut ms = Self::from_str(&script)?;
        ms.script_path = Some(path);

        Ok(ms)
    }

    /// Parse a script from its contents.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of steps
        let mut steps: VecDeque<Step> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Mission script regex is invalid");

        for cap in re.captures_iter(script) {
            // Both groups are mandatory so will be present on any match
            let (step_str, cmd_str) = match (cap.get(1), cap.get(2)) {
                (Some(s), Some(c)) => (s.as_str(), c.as_str()),
                _ => continue
            };

            // Parse the step number
            let number: u64 = step_str
                .parse()
                .map_err(|e| ScriptError::InvalidStep(format!("{}", e)))?;

            if let Some(prev) = steps.back() {
                if number <= prev.number {
                    return Err(ScriptError::NonIncreasingStep(number, prev.number))
                }
            }

            // Parse the command. The scripts contain JSON only.
            let cmd = MissionCmd::from_json(cmd_str)
                .map_err(|e| ScriptError::InvalidCmd(number, e))?;

            steps.push_back(Step {
                number,
                cmd
            });
        }

        if steps.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(MissionScript {
            script_path: None,
            steps
        })
    }

    /// Pop the next step of the script, or `None` at the end of the script.
    pub fn next_step(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    /// Get the number of steps remaining in the script
    pub fn get_num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Path the script was loaded from, if it was loaded from a file
    pub fn get_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}
