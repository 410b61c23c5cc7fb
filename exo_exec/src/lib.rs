//! # Exoskeleton library.
//!
//! This library allows the executable, benchmarks and other crates in the
//! workspace to access items defined inside the exoskeleton crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Angle output - the latest commanded angles, shared with actuator consumers
pub mod angle_output;

/// Data store - state owned by the main loop
pub mod data_store;

/// Event sources - operator toggles from the console or a script
pub mod event_source;

/// Heartbeat - debug indicator toggled from the tick callback
pub mod heartbeat;

/// Executable parameters
pub mod params;

/// Ticker - fixed period tick service
pub mod ticker;

/// Trajectory generation module - produces the joint angles of the gait
pub mod traj_gen;
