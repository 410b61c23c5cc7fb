//! # Data Store

use log::{info, warn};

use crate::{
    params::ExecParams,
    traj_gen::{self, TrajGen},
};
use comms_if::{eqpt::joint::AngleSet, event::ToggleEvent};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State owned by the main loop.
///
/// Nothing in here is touched by the tick callback.
#[derive(Default)]
pub struct DataStore {
    // Step management
    /// Number of generation steps executed
    pub num_steps: u64,

    /// True if this step falls on a status reporting boundary
    pub is_status_step: bool,

    /// True if this step falls on an archiving boundary
    pub is_archive_step: bool,

    // Operator control
    /// The operator's view of the run state, flipped by every toggle.
    pub stopped: bool,

    /// Number of toggles consumed
    pub num_toggles: u64,

    // TrajGen
    pub traj_gen: TrajGen,
    pub traj_gen_input: traj_gen::InputData,
    pub traj_gen_status_rpt: traj_gen::StatusReport,

    // Monitoring counters
    /// Ticks dropped because more than the catch up limit were pending
    pub num_missed_steps: u64,

    /// Number of main loop iterations which dropped ticks
    pub num_catchup_overflows: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Create the store around an initialised generator.
    pub fn new(traj_gen: TrajGen) -> Self {
        let stopped = !traj_gen.is_running();
        let traj_gen_status_rpt = traj_gen.report();

        Self {
            stopped,
            traj_gen,
            traj_gen_status_rpt,
            ..Default::default()
        }
    }

    /// Flip the stopped flag and queue the matching command for TrajGen.
    pub fn handle_toggle(&mut self, event: &ToggleEvent) {
        self.stopped = !self.stopped;
        self.num_toggles += 1;

        let cmd = if self.stopped {
            traj_gen::TrajCmd::Stop
        } else {
            traj_gen::TrajCmd::Resume
        };

        info!(
            "Toggle from {:?}: {}",
            event.origin,
            if self.stopped { "stopping" } else { "resuming" }
        );

        self.traj_gen_input.cmd = Some(cmd);
    }

    /// Perform actions required at the start of a generation step.
    ///
    /// Sets the status and archive flags for this step.
    pub fn step_start(&mut self, status_period_ticks: u64, archive_period_ticks: u64) {
        self.is_status_step = status_period_ticks > 0 && self.num_steps % status_period_ticks == 0;
        self.is_archive_step =
            archive_period_ticks > 0 && self.num_steps % archive_period_ticks == 0;
    }

    /// Perform actions required at the end of a generation step.
    pub fn step_end(&mut self) {
        // Commands apply to one step only
        self.traj_gen_input = traj_gen::InputData::default();
        self.num_steps = self.num_steps.wrapping_add(1);
    }

    /// Run one generation step for each pending tick, up to the catch up
    /// limit.
    ///
    /// Any queued toggle command is applied by the first step, before its
    /// angles are generated. `on_step` is called with the angles of every
    /// step that produced some, while the step's status and archive flags
    /// are set. Returns the number of steps run.
    pub fn run_pending_steps<F>(
        &mut self,
        pending: u64,
        exec_params: &ExecParams,
        mut on_step: F,
    ) -> u64
    where
        F: FnMut(&mut DataStore, &AngleSet),
    {
        let num_steps = pending.min(exec_params.max_catchup_ticks);
        self.record_missed_steps(pending - num_steps);

        for _ in 0..num_steps {
            self.step_start(
                exec_params.status_period_ticks,
                exec_params.archive_period_ticks,
            );

            match self.traj_gen.proc(&self.traj_gen_input) {
                Ok((angles, report)) => {
                    self.traj_gen_status_rpt = report;
                    on_step(self, &angles);
                }
                Err(e) => warn!("Error during TrajGen processing: {}", e),
            }

            self.step_end();
        }

        num_steps
    }

    /// Record ticks dropped by the catch up limit.
    pub fn record_missed_steps(&mut self, num_missed: u64) {
        if num_missed == 0 {
            return;
        }

        // Warn on the first overflow only
        if self.num_catchup_overflows == 0 {
            warn!("Main loop fell behind, dropped {} steps", num_missed);
        }

        self.num_missed_steps += num_missed;
        self.num_catchup_overflows += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::event::EventOrigin;

    fn ds() -> DataStore {
        DataStore::new(TrajGen::new(traj_gen::Params::default()).unwrap())
    }

    fn exec_params() -> ExecParams {
        ExecParams {
            max_catchup_ticks: 10,
            ..ExecParams::default()
        }
    }

    #[test]
    fn test_toggle_flips_stopped() {
        let mut ds = ds();
        assert!(!ds.stopped);

        let e = ToggleEvent::now(EventOrigin::Console(b' '));

        ds.handle_toggle(&e);
        assert!(ds.stopped);
        assert_eq!(ds.traj_gen_input.cmd, Some(traj_gen::TrajCmd::Stop));

        ds.handle_toggle(&e);
        assert!(!ds.stopped);
        assert_eq!(ds.traj_gen_input.cmd, Some(traj_gen::TrajCmd::Resume));
        assert_eq!(ds.num_toggles, 2);

        ds.step_end();
        assert_eq!(ds.traj_gen_input.cmd, None);
    }

    #[test]
    fn test_step_flags() {
        let mut ds = ds();

        ds.step_start(3, 0);
        assert!(ds.is_status_step);
        assert!(!ds.is_archive_step);
        ds.step_end();

        ds.step_start(3, 2);
        assert!(!ds.is_status_step);
        assert!(!ds.is_archive_step);
        ds.step_end();

        ds.step_start(3, 2);
        assert!(ds.is_archive_step);
    }

    #[test]
    fn test_missed_steps() {
        let mut ds = ds();
        ds.record_missed_steps(0);
        assert_eq!(ds.num_catchup_overflows, 0);

        ds.record_missed_steps(4);
        ds.record_missed_steps(2);
        assert_eq!(ds.num_missed_steps, 6);
        assert_eq!(ds.num_catchup_overflows, 2);
    }

    #[test]
    fn test_pending_steps_within_limit() {
        let mut ds = ds();
        let mut num_calls = 0;

        let num_steps = ds.run_pending_steps(5, &exec_params(), |_, _| num_calls += 1);

        assert_eq!(num_steps, 5);
        assert_eq!(num_calls, 5);
        assert_eq!(ds.num_steps, 5);
        assert_eq!(ds.traj_gen.phase(), 5);
        assert_eq!(ds.traj_gen_status_rpt.phase, 5);
        assert_eq!(ds.num_missed_steps, 0);
        assert_eq!(ds.num_catchup_overflows, 0);
    }

    #[test]
    fn test_pending_steps_over_limit() {
        let mut ds = ds();
        let mut last = AngleSet::default();

        let num_steps = ds.run_pending_steps(25, &exec_params(), |_, angles| last = *angles);

        assert_eq!(num_steps, 10);
        assert_eq!(ds.traj_gen.phase(), 10);
        assert_eq!(last, ds.traj_gen.angles());
        assert_eq!(ds.num_missed_steps, 15);
        assert_eq!(ds.num_catchup_overflows, 1);
    }

    #[test]
    fn test_toggle_between_ticks_applies_first() {
        let mut ds = ds();
        ds.run_pending_steps(3, &exec_params(), |_, _| ());
        assert_eq!(ds.traj_gen.phase(), 3);

        // A toggle arriving with no tick pending stays queued
        ds.handle_toggle(&ToggleEvent::now(EventOrigin::Console(b' ')));
        assert_eq!(ds.run_pending_steps(0, &exec_params(), |_, _| ()), 0);
        assert_eq!(ds.traj_gen_input.cmd, Some(traj_gen::TrajCmd::Stop));
        assert!(ds.traj_gen.is_running());

        // The next step stops before generating, so the phase holds
        let held = ds.traj_gen.angles();
        let mut angles = AngleSet::default();
        ds.run_pending_steps(1, &exec_params(), |_, a| angles = *a);
        assert!(!ds.traj_gen.is_running());
        assert_eq!(ds.traj_gen.phase(), 3);
        assert_eq!(angles, held);
        assert_eq!(ds.traj_gen_input.cmd, None);
    }

    #[test]
    fn test_step_flags_seen_by_callback() {
        let mut ds = ds();
        let p = ExecParams {
            status_period_ticks: 4,
            archive_period_ticks: 2,
            ..exec_params()
        };
        let mut flags = Vec::new();

        ds.run_pending_steps(5, &p, |ds, _| {
            flags.push((ds.is_status_step, ds.is_archive_step))
        });

        assert_eq!(
            flags,
            vec![
                (true, true),
                (false, false),
                (false, true),
                (false, false),
                (true, true)
            ]
        );
    }
}
