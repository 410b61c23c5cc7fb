//! # Toggle script interpreter module
//!
//! This module provides an interpreter for toggle scripts, allowing the
//! operator's start/stop toggles to be replayed at fixed times without a
//! console attached.
//!
//! A script is a list of `<time_s>: <CMD>;` entries, where `CMD` is either
//! `TOGGLE` or `END` (case-insensitive). Anything outside of an entry is
//! ignored, so comments can be written freely on their own lines.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// The time the command is supposed to execute at
    pub exec_time_s: f64,

    /// The command to run
    pub cmd: ScriptCmd,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_cmds` to acquire a list of commands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: Option<PathBuf>,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Commands available in a toggle script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCmd {
    /// Toggle between running and stopped.
    Toggle,

    /// End of the script, the executable shall stop.
    End,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1:?}")]
    InvalidCmd(f64, String),

    #[error("Script entry at {0} s is earlier than the entry before it")]
    OutOfOrder(f64),
}

/// Commands that are due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingCmds {
    None,
    Some(Vec<ScriptCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        let mut si = Self::from_script_str(&script)?;
        si._script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of commands
        let mut cmd_queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("The script regex is invalid");

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap[1].parse() {
                Ok(t) => t,
                Err(e) => return Err(ScriptError::InvalidTimestamp(format!("{}", e))),
            };

            // Parse the command from the payload
            let payload = cap[3].trim();
            let cmd = match payload.to_ascii_uppercase().as_str() {
                "TOGGLE" => ScriptCmd::Toggle,
                "END" => ScriptCmd::End,
                _ => return Err(ScriptError::InvalidCmd(exec_time_s, payload.to_string())),
            };

            // Entries must be in time order, the queue is only ever popped
            // from the front.
            if let Some(prev) = cmd_queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s));
                }
            }

            // Build command from the match
            cmd_queue.push_back(Command { exec_time_s, cmd });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            _script_path: None,
            cmds: cmd_queue,
        })
    }

    /// Return the commands which are due at `current_time_s`.
    ///
    /// Once an `END` command is due, or the queue runs out, `EndOfScript` is
    /// returned on every call.
    pub fn get_pending_cmds(&mut self, current_time_s: f64) -> PendingCmds {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript;
        }

        let mut cmd_vec: Vec<ScriptCmd> = vec![];

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding commands
        // until the exec times are larger than the current time.
        while let Some(head) = self.cmds.front() {
            if head.exec_time_s > current_time_s {
                break;
            }

            if head.cmd == ScriptCmd::End {
                self.cmds.clear();
                break;
            }

            cmd_vec.push(head.cmd);
            self.cmds.pop_front();
        }

        // Toggles due in the same call as the end are still returned, the
        // next call reports the end.
        if !cmd_vec.is_empty() {
            PendingCmds::Some(cmd_vec)
        } else if self.cmds.is_empty() {
            PendingCmds::EndOfScript
        } else {
            PendingCmds::None
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = "
        # Walk for two seconds, pause, then walk again
        2.0: TOGGLE;
        3.5: toggle;
        6: END;
    ";

    #[test]
    fn test_parse_script() {
        let si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();
        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 6.0);
    }

    #[test]
    fn test_pending_cmds() {
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        assert_eq!(si.get_pending_cmds(0.0), PendingCmds::None);
        assert_eq!(
            si.get_pending_cmds(2.0),
            PendingCmds::Some(vec![ScriptCmd::Toggle])
        );
        assert_eq!(si.get_pending_cmds(2.5), PendingCmds::None);
        assert_eq!(
            si.get_pending_cmds(3.6),
            PendingCmds::Some(vec![ScriptCmd::Toggle])
        );
        assert_eq!(si.get_pending_cmds(5.0), PendingCmds::None);
        assert_eq!(si.get_pending_cmds(6.0), PendingCmds::EndOfScript);
        assert_eq!(si.get_pending_cmds(7.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_toggles_before_end_are_kept() {
        let mut si = ScriptInterpreter::from_script_str("0.1: TOGGLE;\n0.2: END;\n").unwrap();

        assert_eq!(
            si.get_pending_cmds(1.0),
            PendingCmds::Some(vec![ScriptCmd::Toggle])
        );
        assert_eq!(si.get_pending_cmds(1.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_invalid_scripts() {
        match ScriptInterpreter::from_script_str("nothing to see here") {
            Err(ScriptError::ScriptEmpty) => (),
            r => panic!("Expected empty script, got {:?}", r),
        }

        match ScriptInterpreter::from_script_str("1.0: JUMP;") {
            Err(ScriptError::InvalidCmd(t, c)) => {
                assert_eq!(t, 1.0);
                assert_eq!(c, "JUMP");
            }
            r => panic!("Expected invalid command, got {:?}", r),
        }

        match ScriptInterpreter::from_script_str("2.0: TOGGLE;\n1.0: TOGGLE;") {
            Err(ScriptError::OutOfOrder(t)) => assert_eq!(t, 1.0),
            r => panic!("Expected out of order, got {:?}", r),
        }
    }

    #[test]
    fn test_missing_script() {
        let path = std::env::temp_dir().join("exo_sw_no_such_script.txt");
        match ScriptInterpreter::new(path) {
            Err(ScriptError::ScriptNotFound(_)) => (),
            r => panic!("Expected script not found, got {:?}", r),
        }
    }
}
