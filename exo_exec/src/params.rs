//! # Exoskeleton Executable Parameters
//!
//! This module provides parameters for the executable's main loop and tick
//! service.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traj_gen;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest relative difference accepted between the tick period and the
/// trajectory sample time.
const PERIOD_MATCH_TOLERANCE: f64 = 1e-9;

/// Longest tick period accepted.
///
/// Units: seconds
pub const MAX_TICK_PERIOD_S: f64 = 60.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecParams {
    /// Period of the tick service.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Number of ticks between heartbeat indicator toggles.
    pub heartbeat_period_ticks: u64,

    /// Largest number of pending ticks processed in one main loop iteration,
    /// any more are dropped and counted as missed steps.
    pub max_catchup_ticks: u64,

    /// Number of generation steps between status log messages.
    pub status_period_ticks: u64,

    /// Number of generation steps between archive records, 0 disables
    /// archiving.
    pub archive_period_ticks: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExecParamsError {
    #[error(
        "The tick period must be positive and at most {max} s, found {0} s",
        max = MAX_TICK_PERIOD_S
    )]
    InvalidTickPeriod(f64),

    #[error(
        "The tick period ({tick_period_s} s) must equal the trajectory sample time \
        ({sample_time_s} s)"
    )]
    PeriodMismatch { tick_period_s: f64, sample_time_s: f64 },

    #[error("{0} must be at least 1")]
    ZeroPeriod(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ExecParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.001,
            heartbeat_period_ticks: 1000,
            max_catchup_ticks: 10,
            status_period_ticks: 1000,
            archive_period_ticks: 10,
        }
    }
}

impl ExecParams {
    /// Check the parameters against themselves and the trajectory parameters.
    pub fn validate(&self, traj_params: &traj_gen::Params) -> Result<(), ExecParamsError> {
        self.tick_period()?;

        let sample_time_s = traj_params.sample_time_s;
        if ((self.tick_period_s - sample_time_s) / self.tick_period_s).abs() > PERIOD_MATCH_TOLERANCE {
            return Err(ExecParamsError::PeriodMismatch {
                tick_period_s: self.tick_period_s,
                sample_time_s,
            });
        }

        if self.heartbeat_period_ticks == 0 {
            return Err(ExecParamsError::ZeroPeriod("heartbeat_period_ticks"));
        }
        if self.max_catchup_ticks == 0 {
            return Err(ExecParamsError::ZeroPeriod("max_catchup_ticks"));
        }
        if self.status_period_ticks == 0 {
            return Err(ExecParamsError::ZeroPeriod("status_period_ticks"));
        }

        Ok(())
    }

    /// The tick period as a duration.
    pub fn tick_period(&self) -> Result<Duration, ExecParamsError> {
        // NaN fails both comparisons
        if self.tick_period_s > 0.0 && self.tick_period_s <= MAX_TICK_PERIOD_S {
            Ok(Duration::from_secs_f64(self.tick_period_s))
        } else {
            Err(ExecParamsError::InvalidTickPeriod(self.tick_period_s))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_match_traj_gen() {
        let p = ExecParams::default();
        p.validate(&traj_gen::Params::default()).unwrap();
        assert_eq!(p.tick_period().unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn test_invalid() {
        let traj = traj_gen::Params::default();

        let p = ExecParams {
            tick_period_s: 0.0,
            ..ExecParams::default()
        };
        match p.validate(&traj) {
            Err(ExecParamsError::InvalidTickPeriod(_)) => (),
            r => panic!("Expected an invalid tick period, got {:?}", r),
        }

        let p = ExecParams {
            tick_period_s: 0.002,
            ..ExecParams::default()
        };
        match p.validate(&traj) {
            Err(ExecParamsError::PeriodMismatch { .. }) => (),
            r => panic!("Expected a period mismatch, got {:?}", r),
        }

        let p = ExecParams {
            heartbeat_period_ticks: 0,
            ..ExecParams::default()
        };
        match p.validate(&traj) {
            Err(ExecParamsError::ZeroPeriod(name)) => assert_eq!(name, "heartbeat_period_ticks"),
            r => panic!("Expected a zero period, got {:?}", r),
        }
    }

    #[test]
    fn test_huge_tick_period_rejected() {
        let traj = traj_gen::Params {
            half_cycle_s: 1e20,
            sample_time_s: 1e20,
            ..traj_gen::Params::default()
        };

        for &tick_period_s in &[1e20, f64::INFINITY, f64::NAN, -0.001] {
            let p = ExecParams {
                tick_period_s,
                ..ExecParams::default()
            };
            match p.tick_period() {
                Err(ExecParamsError::InvalidTickPeriod(_)) => (),
                r => panic!("Expected an invalid tick period, got {:?}", r),
            }
            match p.validate(&traj) {
                Err(ExecParamsError::InvalidTickPeriod(_)) => (),
                r => panic!("Expected an invalid tick period, got {:?}", r),
            }
        }

        let p = ExecParams {
            tick_period_s: MAX_TICK_PERIOD_S,
            ..ExecParams::default()
        };
        assert_eq!(p.tick_period().unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_from_toml() {
        let p: ExecParams =
            util::params::from_toml_str("tick_period_s = 0.002\narchive_period_ticks = 0\n").unwrap();
        assert_eq!(p.tick_period_s, 0.002);
        assert_eq!(p.archive_period_ticks, 0);
        assert_eq!(p.max_catchup_ticks, 10);
    }
}
