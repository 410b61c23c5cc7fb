//! # Communications interface crate.
//!
//! Provides all common interfaces shared between the trajectory core and
//! its external collaborators (actuator consumers and operator input).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Demand definitions for equipment (the leg joints)
pub mod eqpt;

/// Operator toggle events and the sources which produce them
pub mod event;
