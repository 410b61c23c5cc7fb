//! Scripted toggles

use std::{path::Path, time::Instant};

use log::info;
use util::script_interpreter::{PendingCmds, ScriptCmd, ScriptInterpreter};

use super::{EventOrigin, EventSource, EventSourceError, ToggleEvent};

/// Replays a toggle script, timed from the moment the source is created.
pub struct ScriptEventSource {
    si: ScriptInterpreter,
    start: Instant,

    /// Toggles which are due but not yet consumed.
    num_pending: usize,

    /// Script time at which the pending toggles were found to be due.
    pending_time_s: f64,

    end_reached: bool,
}

impl ScriptEventSource {
    /// Load the script at the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, EventSourceError> {
        let si = ScriptInterpreter::new(script_path).map_err(EventSourceError::ScriptError)?;

        info!(
            "Loaded script lasts {:.02} s and contains {} commands",
            si.get_duration(),
            si.get_num_cmds()
        );

        Ok(Self::from_interpreter(si))
    }

    pub fn from_interpreter(si: ScriptInterpreter) -> Self {
        Self {
            si,
            start: Instant::now(),
            num_pending: 0,
            pending_time_s: 0.0,
            end_reached: false,
        }
    }

    /// Collect everything that is due at `elapsed_s` into the script.
    fn poll_at(&mut self, elapsed_s: f64) {
        if self.end_reached {
            return;
        }

        match self.si.get_pending_cmds(elapsed_s) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                // The end only ever arrives as EndOfScript
                let num_toggles = cmds.iter().filter(|&&c| c == ScriptCmd::Toggle).count();
                if num_toggles > 0 && self.num_pending == 0 {
                    self.pending_time_s = elapsed_s;
                }
                self.num_pending += num_toggles;
            }
            PendingCmds::EndOfScript => {
                info!("End of toggle script reached");
                self.end_reached = true;
            }
        }
    }

    fn poll(&mut self) {
        let elapsed_s = self.start.elapsed().as_secs_f64();
        self.poll_at(elapsed_s);
    }
}

impl EventSource for ScriptEventSource {
    fn has_event(&mut self) -> bool {
        self.poll();
        self.num_pending > 0
    }

    fn consume_event(&mut self) -> Option<ToggleEvent> {
        self.poll();

        if self.num_pending == 0 {
            return None;
        }

        self.num_pending -= 1;
        Some(ToggleEvent::now(EventOrigin::Script(self.pending_time_s)))
    }

    fn is_exhausted(&self) -> bool {
        self.end_reached && self.num_pending == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn source(script: &str) -> ScriptEventSource {
        ScriptEventSource::from_interpreter(ScriptInterpreter::from_script_str(script).unwrap())
    }

    #[test]
    fn test_toggles_released_on_time() {
        let mut s = source("1.0: TOGGLE;\n2.5: toggle;\n4.0: END;\n");

        s.poll_at(0.5);
        assert_eq!(s.num_pending, 0);

        s.poll_at(1.0);
        assert_eq!(s.num_pending, 1);
        assert!(!s.is_exhausted());

        s.poll_at(3.0);
        assert_eq!(s.num_pending, 2);

        s.poll_at(4.0);
        assert!(s.end_reached);

        // Pending toggles are still delivered after the end
        assert!(!s.is_exhausted());
        assert!(s.consume_event().is_some());
        assert!(s.consume_event().is_some());
        assert!(s.consume_event().is_none());
        assert!(s.is_exhausted());
    }

    #[test]
    fn test_immediate_script() {
        let mut s = source("0.0: TOGGLE;\n0.0: TOGGLE;\n0.0: END;\n");

        assert!(s.has_event());
        match s.consume_event() {
            Some(ToggleEvent {
                origin: EventOrigin::Script(t),
                ..
            }) => assert!(t >= 0.0),
            e => panic!("Expected a scripted toggle, got {:?}", e),
        }
        assert!(s.consume_event().is_some());

        // The end is reported on the poll after the toggles
        assert!(!s.has_event());
        assert!(s.is_exhausted());
    }

    #[test]
    fn test_end_due_with_toggles() {
        let mut s = source("0.1: TOGGLE;\n0.2: TOGGLE;\n0.3: END;\n");

        // The toggles are released first and the end is seen on the next poll
        s.poll_at(1.0);
        assert_eq!(s.num_pending, 2);
        assert_eq!(s.pending_time_s, 1.0);
        assert!(!s.end_reached);

        s.poll_at(1.0);
        assert!(s.end_reached);
        assert_eq!(s.num_pending, 2);
    }

    #[test]
    fn test_missing_script() {
        match ScriptEventSource::new("/no/such/toggle/script.txt") {
            Err(EventSourceError::ScriptError(_)) => (),
            _ => panic!("Expected a script error"),
        }
    }
}
