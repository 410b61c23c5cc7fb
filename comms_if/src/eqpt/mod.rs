//! # Equipment Interface
//!
//! This module defines the interface structures which are produced for the actuator drivers.

pub mod joint;
