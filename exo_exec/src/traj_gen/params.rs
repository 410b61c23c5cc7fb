//! Parameters structure for TrajGen

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{TrajGenError, MAX_CYCLE_TICKS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest relative difference between the half cycle time and a whole
/// number of samples.
const HALF_CYCLE_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- TIMING ----
    /// Duration of one step, i.e. half of a full gait cycle.
    ///
    /// Units: seconds
    pub half_cycle_s: f64,

    /// Duration of one generation step. Must match the period of the tick
    /// which drives the generator.
    ///
    /// Units: seconds
    pub sample_time_s: f64,

    /// If true the generator starts running, otherwise it waits for the
    /// first resume.
    pub start_running: bool,

    // ---- HIP ----
    /// Walking (trunk) angle reported with every angle set. The hip angles
    /// are relative to it.
    ///
    /// Units: degrees
    pub walking_angle_deg: f64,

    /// Peak hip flexion during swing.
    ///
    /// Units: degrees
    pub max_hip_flexion_deg: f64,

    /// Fraction of a step at which the peak hip (and knee) flexion is
    /// reached.
    pub max_hip_flexion_time_portion: f64,

    /// Hip angle at toe off, the start of the swing.
    ///
    /// Units: degrees
    pub hip_swing_start_deg: f64,

    /// Length of a step.
    ///
    /// Units: meters
    pub step_range_m: f64,

    /// Length of the leg, from hip to ankle.
    ///
    /// Units: meters
    pub leg_length_m: f64,

    // ---- KNEE ----
    /// Peak knee flexion during swing.
    ///
    /// Units: degrees
    pub max_knee_flexion_deg: f64,

    /// Knee flexion during the loading response of the stance.
    ///
    /// Units: degrees
    pub second_knee_flexion_deg: f64,

    /// Knee flexion when the leg is nearly straight.
    ///
    /// Units: degrees
    pub min_knee_flexion_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            half_cycle_s: 1.0,
            sample_time_s: 0.001,
            start_running: true,
            walking_angle_deg: 0.0,
            max_hip_flexion_deg: 36.0,
            max_hip_flexion_time_portion: 0.6,
            hip_swing_start_deg: -6.934,
            step_range_m: 0.78,
            leg_length_m: 1.1,
            max_knee_flexion_deg: 60.0,
            second_knee_flexion_deg: 15.0,
            min_knee_flexion_deg: 3.0,
        }
    }
}

impl Params {
    /// Check the parameters describe a gait that can be generated.
    pub fn validate(&self) -> Result<(), TrajGenError> {
        if !self.sample_time_s.is_finite() || self.sample_time_s <= 0.0 {
            return Err(TrajGenError::InvalidSampleTime(self.sample_time_s));
        }

        let step_ticks = self.step_ticks()?;
        let cycle_ticks = step_ticks.saturating_mul(2);
        if cycle_ticks > MAX_CYCLE_TICKS {
            return Err(TrajGenError::CycleTooLong(cycle_ticks));
        }

        let portion = self.max_hip_flexion_time_portion;
        if !(portion > 0.0 && portion < 1.0) {
            return Err(TrajGenError::InvalidFlexionTimePortion(portion));
        }

        if !(self.step_range_m.is_finite()
            && self.leg_length_m.is_finite()
            && self.step_range_m >= 0.0
            && self.leg_length_m > 0.5 * self.step_range_m)
        {
            return Err(TrajGenError::InvalidLegGeometry {
                step_range_m: self.step_range_m,
                leg_length_m: self.leg_length_m,
            });
        }

        let angles = [
            ("walking_angle_deg", self.walking_angle_deg),
            ("max_hip_flexion_deg", self.max_hip_flexion_deg),
            ("hip_swing_start_deg", self.hip_swing_start_deg),
            ("max_knee_flexion_deg", self.max_knee_flexion_deg),
            ("second_knee_flexion_deg", self.second_knee_flexion_deg),
            ("min_knee_flexion_deg", self.min_knee_flexion_deg),
        ];
        for (name, value) in angles.iter() {
            if !value.is_finite() {
                return Err(TrajGenError::NonFiniteAngle(*name));
            }
        }

        Ok(())
    }

    /// Number of generation steps in one step of the gait (half a cycle).
    pub fn step_ticks(&self) -> Result<u64, TrajGenError> {
        let err = TrajGenError::InvalidHalfCycle {
            half_cycle_s: self.half_cycle_s,
            sample_time_s: self.sample_time_s,
        };

        let ticks = match util::time::seconds_to_ticks(self.half_cycle_s, self.sample_time_s) {
            Some(t) => t,
            None => return Err(err),
        };

        let exact = self.half_cycle_s / self.sample_time_s;
        if ((ticks as f64 - exact) / exact).abs() > HALF_CYCLE_TOLERANCE {
            return Err(err);
        }

        Ok(ticks)
    }

    /// Hip rotation needed to cover one step, from the isoceles triangle
    /// formed by the two legs and the step.
    ///
    /// Units: degrees
    pub fn step_angle_deg(&self) -> f64 {
        2.0 * (self.step_range_m / (2.0 * self.leg_length_m))
            .asin()
            .to_degrees()
    }

    /// Hip angle at heel strike, the end of the swing.
    ///
    /// Never above the peak hip flexion.
    ///
    /// Units: degrees
    pub fn heel_strike_hip_deg(&self) -> f64 {
        (self.hip_swing_start_deg + self.step_angle_deg()).min(self.max_hip_flexion_deg)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let p = Params::default();
        p.validate().unwrap();
        assert_eq!(p.step_ticks().unwrap(), 1000);
    }

    #[test]
    fn test_step_angle() {
        let p = Params::default();

        // 0.78 m steps on a 1.1 m leg need roughly 41.5 degrees of hip travel
        assert!((p.step_angle_deg() - 41.53).abs() < 0.01);
        assert!((p.heel_strike_hip_deg() - (p.hip_swing_start_deg + p.step_angle_deg())).abs() < 1e-12);

        let long_step = Params {
            step_range_m: 1.0,
            ..Params::default()
        };
        assert_eq!(long_step.heel_strike_hip_deg(), long_step.max_hip_flexion_deg);
    }

    #[test]
    fn test_invalid_timing() {
        let p = Params {
            sample_time_s: 0.0,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::InvalidSampleTime(_)) => (),
            r => panic!("Expected invalid sample time, got {:?}", r),
        }

        let p = Params {
            half_cycle_s: 0.0105,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::InvalidHalfCycle { .. }) => (),
            r => panic!("Expected invalid half cycle, got {:?}", r),
        }

        let p = Params {
            half_cycle_s: 1.0e7,
            sample_time_s: 1.0e-3,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::CycleTooLong(_)) => (),
            r => panic!("Expected cycle too long, got {:?}", r),
        }
    }

    #[test]
    fn test_invalid_shape() {
        let p = Params {
            max_hip_flexion_time_portion: 1.0,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::InvalidFlexionTimePortion(_)) => (),
            r => panic!("Expected invalid portion, got {:?}", r),
        }

        let p = Params {
            leg_length_m: 0.3,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::InvalidLegGeometry { .. }) => (),
            r => panic!("Expected invalid geometry, got {:?}", r),
        }

        let p = Params {
            min_knee_flexion_deg: f64::INFINITY,
            ..Params::default()
        };
        match p.validate() {
            Err(TrajGenError::NonFiniteAngle(name)) => assert_eq!(name, "min_knee_flexion_deg"),
            r => panic!("Expected non finite angle, got {:?}", r),
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let p: Params = util::params::from_toml_str("half_cycle_s = 0.5\n").unwrap();
        assert_eq!(p.half_cycle_s, 0.5);
        assert_eq!(p.max_hip_flexion_deg, 36.0);
        assert_eq!(p.step_ticks().unwrap(), 500);
    }
}
