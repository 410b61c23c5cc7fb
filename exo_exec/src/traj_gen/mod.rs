//! Trajectory generation module
//!
//! Produces the commanded hip and knee angles of both legs, one step at a
//! time, following a periodic gait cycle. The generator can be stopped and
//! resumed at any step without the commanded angles jumping: a stop freezes
//! both the phase and the last angles, a resume continues from the frozen
//! phase.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod profile;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use profile::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest gait cycle accepted, in steps.
///
/// Keeps the phase exactly representable when converted to a fraction of the
/// cycle.
pub const MAX_CYCLE_TICKS: u64 = 1 << 32;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Configuration errors detected while initialising TrajGen.
///
/// All of these are fatal, the generator refuses to start with them.
#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("The sample time must be finite and positive, found {0} s")]
    InvalidSampleTime(f64),

    #[error(
        "The half cycle time ({half_cycle_s} s) must be a positive whole number of samples \
        ({sample_time_s} s)"
    )]
    InvalidHalfCycle { half_cycle_s: f64, sample_time_s: f64 },

    #[error("The gait cycle is {0} steps long, longer than the maximum of {max}", max = MAX_CYCLE_TICKS)]
    CycleTooLong(u64),

    #[error("The peak hip flexion time portion must be strictly between 0 and 1, found {0}")]
    InvalidFlexionTimePortion(f64),

    #[error(
        "The leg length ({leg_length_m} m) must be greater than half the step range \
        ({step_range_m} m)"
    )]
    InvalidLegGeometry { step_range_m: f64, leg_length_m: f64 },

    #[error("The angle parameter {0} is not a finite number")]
    NonFiniteAngle(&'static str),

    #[error("Invalid keyframes for the {0} profile: {1}")]
    InvalidKeyframes(&'static str, &'static str),
}
