//! Implementations for the TrajGen state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::{Params, Profile, TrajGenError};
use comms_if::eqpt::joint::{AngleSet, JointId};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory generation module state
#[derive(Default)]
pub struct TrajGen {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    pub(crate) state: TrajectoryState,

    hip: Profile,
    knee: Profile,

    /// Number of steps in one full gait cycle, zero until initialised.
    cycle_ticks: u64,

    /// Number of steps in one step of the gait, the right leg lags the left
    /// by this much.
    half_cycle_ticks: u64,

    arch_angles: Archiver,
}

/// The trajectory state, owned by whichever context calls
/// `generate_trajectory`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryState {
    /// Position in the gait cycle, in steps. Always less than the cycle
    /// length, wraps to zero at the end of each cycle.
    pub phase: u64,

    /// Number of complete gait cycles, wraps on overflow.
    pub cycle_count: u64,

    /// True if the phase is advancing.
    pub running: bool,

    /// Latched once the left leg completes its first step, before this the
    /// right leg holds its toe off pose.
    pub right_started: bool,

    /// The last commanded angles.
    pub joint_angles: AngleSet,
}

/// Commands accepted by TrajGen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrajCmd {
    /// Freeze the phase and hold the last angles.
    Stop,

    /// Continue from the frozen phase.
    Resume,
}

/// Input data to Trajectory Generation.
#[derive(Default)]
pub struct InputData {
    /// The command to apply before this step, or `None` if there is no new
    /// command.
    pub cmd: Option<TrajCmd>,
}

/// Status report for TrajGen processing.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub running: bool,
    pub phase: u64,
    pub cycle_count: u64,
    pub right_started: bool,

    /// True if the angles computed this step were invalid and the previous
    /// angles were held instead.
    pub fault_this_step: bool,

    /// Total number of steps where a fault was absorbed.
    pub num_faults: u64,
}

/// One row of the angle archive.
#[derive(Serialize)]
struct AngleRecord {
    time_s: f64,
    running: bool,
    phase: u64,
    walking_angle_deg: f64,
    hip_l_deg: f64,
    knee_l_deg: f64,
    hip_r_deg: f64,
    knee_r_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajGen {
    type InitData = Params;
    type InitError = TrajGenError;

    type InputData = InputData;
    type OutputData = AngleSet;
    type StatusReport = StatusReport;
    type ProcError = TrajGenError;

    /// Initialise the TrajGen module.
    ///
    /// Validates the parameters, builds the joint profiles and computes the
    /// angles at phase zero, so that the output is valid before the first
    /// step.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        let hip = Profile::hip(&init_data)?;
        let knee = Profile::knee(&init_data)?;
        let half_cycle_ticks = init_data.step_ticks()?;

        self.hip = hip;
        self.knee = knee;
        self.half_cycle_ticks = half_cycle_ticks;
        self.cycle_ticks = 2 * half_cycle_ticks;

        self.state = TrajectoryState {
            phase: 0,
            cycle_count: 0,
            running: init_data.start_running,
            right_started: false,
            joint_angles: AngleSet::default(),
        };
        self.params = init_data;
        self.state.joint_angles = self.calc_angles(0, false);

        self.report = StatusReport::default();
        self.update_report();

        info!(
            "TrajGen initialised: {} steps per cycle, max step delta {:.4} deg, {}",
            self.cycle_ticks,
            self.max_step_delta_deg(),
            if self.state.running { "running" } else { "stopped" }
        );

        Ok(())
    }

    /// Perform one step of trajectory generation.
    ///
    /// Never returns an error, all per-step faults are absorbed by holding
    /// the last angles.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        match input_data.cmd {
            Some(TrajCmd::Stop) => self.stop_trigger(),
            Some(TrajCmd::Resume) => self.resume_trigger(),
            None => (),
        }

        let angles = self.generate_trajectory();

        Ok((angles, self.report))
    }

    fn make_safe(&mut self) {
        self.stop_trigger();
    }
}

impl Archived for TrajGen {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let a = &self.state.joint_angles;

        self.arch_angles.serialise(AngleRecord {
            time_s: session::try_get_elapsed_seconds().unwrap_or(0.0),
            running: self.state.running,
            phase: self.state.phase,
            walking_angle_deg: a.walking_angle_deg,
            hip_l_deg: a.get(JointId::HipLeft),
            knee_l_deg: a.get(JointId::KneeLeft),
            hip_r_deg: a.get(JointId::HipRight),
            knee_r_deg: a.get(JointId::KneeRight),
        })
    }
}

impl TrajGen {
    /// Create and initialise a new generator.
    pub fn new(params: Params) -> Result<Self, TrajGenError> {
        let mut traj_gen = Self::default();
        traj_gen.init(params)?;
        Ok(traj_gen)
    }

    /// Start archiving the commanded angles into the session.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_angles = Archiver::from_path(session, "traj_gen/angles.csv")?;
        Ok(())
    }

    /// Compute the next commanded angle set.
    ///
    /// While running the phase advances by one step and the angles for the
    /// new phase are returned. While stopped the phase is untouched and the
    /// last angles are returned unchanged.
    ///
    /// Runs in constant time and never allocates.
    pub fn generate_trajectory(&mut self) -> AngleSet {
        // Nothing can advance until the generator has been initialised
        if !self.state.running || self.cycle_ticks == 0 {
            self.report.fault_this_step = false;
            return self.state.joint_angles;
        }

        self.advance_phase();

        let angles = self.calc_angles(self.state.phase, self.state.right_started);

        if angles.is_finite() {
            self.state.joint_angles = angles;
            self.report.fault_this_step = false;
        } else {
            // Only report the start of a run of faults
            if !self.report.fault_this_step {
                warn!(
                    "Invalid angles computed at phase {}, holding last angles",
                    self.state.phase
                );
            }
            self.report.fault_this_step = true;
            self.report.num_faults = self.report.num_faults.wrapping_add(1);
        }

        self.update_report();

        self.state.joint_angles
    }

    /// Stop advancing the trajectory.
    ///
    /// The last angles are held and the phase is frozen. Calling this while
    /// already stopped does nothing.
    pub fn stop_trigger(&mut self) {
        if self.state.running {
            self.state.running = false;
            self.update_report();
            debug!("Trajectory stopped at phase {}", self.state.phase);
        }
    }

    /// Resume advancing the trajectory from the frozen phase.
    ///
    /// Calling this while already running does nothing.
    pub fn resume_trigger(&mut self) {
        if !self.state.running {
            self.state.running = true;
            self.update_report();
            debug!("Trajectory resumed from phase {}", self.state.phase);
        }
    }

    /// True if the phase is advancing.
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Current position in the gait cycle, in steps.
    pub fn phase(&self) -> u64 {
        self.state.phase
    }

    /// The last commanded angles.
    pub fn angles(&self) -> AngleSet {
        self.state.joint_angles
    }

    /// A copy of the full trajectory state.
    pub fn state(&self) -> TrajectoryState {
        self.state
    }

    /// The latest status report.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Number of steps in one gait cycle, zero if not initialised.
    pub fn cycle_ticks(&self) -> u64 {
        self.cycle_ticks
    }

    /// Largest change of any joint angle between two consecutive running
    /// steps.
    ///
    /// Units: degrees
    pub fn max_step_delta_deg(&self) -> f64 {
        self.hip
            .max_step_delta_deg(self.cycle_ticks)
            .max(self.knee.max_step_delta_deg(self.cycle_ticks))
    }

    /// Advance the phase by one step, wrapping at the end of the cycle.
    fn advance_phase(&mut self) {
        self.state.phase += 1;

        if self.state.phase >= self.cycle_ticks {
            self.state.phase = 0;
            self.state.cycle_count = self.state.cycle_count.wrapping_add(1);
        }

        if !self.state.right_started && self.state.phase == self.half_cycle_ticks {
            self.state.right_started = true;
            debug!("Right leg started");
        }
    }

    /// Calculate the angles of all joints at the given phase.
    fn calc_angles(&self, phase: u64, right_started: bool) -> AngleSet {
        let cycle = self.cycle_ticks as f64;

        // The right leg runs half a cycle behind the left once started
        let right_phase = if !right_started {
            0
        } else if phase >= self.half_cycle_ticks {
            phase - self.half_cycle_ticks
        } else {
            phase + self.half_cycle_ticks
        };

        let s_left = phase as f64 / cycle;
        let s_right = right_phase as f64 / cycle;

        // Hip angles are relative to the walking angle, which is reported
        // alongside them
        let mut angles = AngleSet {
            walking_angle_deg: self.params.walking_angle_deg,
            ..AngleSet::default()
        };
        angles.set(JointId::HipLeft, self.hip.eval(s_left));
        angles.set(JointId::KneeLeft, self.knee.eval(s_left));
        angles.set(JointId::HipRight, self.hip.eval(s_right));
        angles.set(JointId::KneeRight, self.knee.eval(s_right));

        angles
    }

    fn update_report(&mut self) {
        self.report.running = self.state.running;
        self.report.phase = self.state.phase;
        self.report.cycle_count = self.state.cycle_count;
        self.report.right_started = self.state.right_started;
    }
}
