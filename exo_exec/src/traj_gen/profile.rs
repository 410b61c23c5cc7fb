//! Periodic joint angle profiles
//!
//! A profile is a fixed list of keyframes over one normalised gait cycle,
//! `s` in `[0, 1]`, blended with a zero-slope cubic so the angle and its
//! rate are both continuous. The first and last keyframes hold the same
//! angle so the profile repeats without a jump.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{Params, TrajGenError};
use util::maths::{lin_map, smooth_interp, SMOOTHSTEP_MAX_SLOPE};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of keyframes held by a profile.
pub const MAX_KEYFRAMES: usize = 6;

/// Fraction of the cycle at which the knee reaches its loading response
/// flexion.
const KNEE_LOADING_RESPONSE_S: f64 = 0.75;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point of a profile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Keyframe {
    /// Position in the normalised cycle.
    pub s: f64,

    /// Angle at this position.
    ///
    /// Units: degrees
    pub angle_deg: f64,
}

/// A periodic angle profile built from keyframes.
///
/// Keyframes are stored inline, evaluating the profile never allocates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Profile {
    keyframes: [Keyframe; MAX_KEYFRAMES],
    num_keyframes: usize,
    max_slope_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Keyframe {
    pub fn new(s: f64, angle_deg: f64) -> Self {
        Self { s, angle_deg }
    }
}

impl Profile {
    /// Build a profile from the given keyframes.
    ///
    /// The keyframes must start at `s = 0`, end at `s = 1`, be strictly
    /// increasing in `s`, and start and end on the same angle.
    pub fn new(name: &'static str, keyframes: &[Keyframe]) -> Result<Self, TrajGenError> {
        let invalid = |reason| TrajGenError::InvalidKeyframes(name, reason);

        if keyframes.len() < 2 || keyframes.len() > MAX_KEYFRAMES {
            return Err(invalid("expected between 2 and MAX_KEYFRAMES keyframes"));
        }

        if keyframes
            .iter()
            .any(|k| !(k.s.is_finite() && k.angle_deg.is_finite()))
        {
            return Err(invalid("keyframes must be finite"));
        }

        let first = keyframes[0];
        let last = keyframes[keyframes.len() - 1];
        if first.s != 0.0 || last.s != 1.0 {
            return Err(invalid("keyframes must span s = 0 to s = 1"));
        }
        if first.angle_deg != last.angle_deg {
            return Err(invalid("first and last keyframes must hold the same angle"));
        }

        let mut max_slope_deg = 0f64;
        for pair in keyframes.windows(2) {
            let ds = pair[1].s - pair[0].s;
            if ds <= 0.0 {
                return Err(invalid("keyframes must be strictly increasing in s"));
            }

            let slope = SMOOTHSTEP_MAX_SLOPE * (pair[1].angle_deg - pair[0].angle_deg).abs() / ds;
            max_slope_deg = max_slope_deg.max(slope);
        }

        let mut stored = [Keyframe::default(); MAX_KEYFRAMES];
        stored[..keyframes.len()].copy_from_slice(keyframes);

        Ok(Self {
            keyframes: stored,
            num_keyframes: keyframes.len(),
            max_slope_deg,
        })
    }

    /// Build the hip profile.
    ///
    /// Toe off at the swing start angle, peak flexion part way through the
    /// swing, heel strike at the end of the swing, then extension back to
    /// toe off through the stance. The walking angle is not included.
    pub fn hip(params: &Params) -> Result<Self, TrajGenError> {
        let flex_s = 0.5 * params.max_hip_flexion_time_portion;

        Self::new(
            "hip",
            &[
                Keyframe::new(0.0, params.hip_swing_start_deg),
                Keyframe::new(flex_s, params.max_hip_flexion_deg),
                Keyframe::new(0.5, params.heel_strike_hip_deg()),
                Keyframe::new(1.0, params.hip_swing_start_deg),
            ],
        )
    }

    /// Build the knee profile.
    ///
    /// Peak flexion in the swing, straight at heel strike, the loading
    /// response flexion in the stance, then straight again by toe off.
    pub fn knee(params: &Params) -> Result<Self, TrajGenError> {
        let flex_s = 0.5 * params.max_hip_flexion_time_portion;

        Self::new(
            "knee",
            &[
                Keyframe::new(0.0, params.min_knee_flexion_deg),
                Keyframe::new(flex_s, params.max_knee_flexion_deg),
                Keyframe::new(0.5, params.min_knee_flexion_deg),
                Keyframe::new(KNEE_LOADING_RESPONSE_S, params.second_knee_flexion_deg),
                Keyframe::new(1.0, params.min_knee_flexion_deg),
            ],
        )
    }

    /// The keyframes of this profile.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes[..self.num_keyframes]
    }

    /// Evaluate the profile at the normalised cycle position `s`.
    ///
    /// `s` outside of `[0, 1]` is clamped to the nearest end. An empty
    /// profile evaluates to NaN.
    pub fn eval(&self, s: f64) -> f64 {
        let keyframes = self.keyframes();

        if keyframes.len() < 2 {
            return std::f64::NAN;
        }

        // At most MAX_KEYFRAMES - 1 segments to search
        for pair in keyframes.windows(2) {
            if s <= pair[1].s {
                let u = lin_map((pair[0].s, pair[1].s), (0.0, 1.0), s);
                return smooth_interp(pair[0].angle_deg, pair[1].angle_deg, u);
            }
        }

        keyframes[keyframes.len() - 1].angle_deg
    }

    /// Largest rate of change of the angle over the cycle.
    ///
    /// Units: degrees per unit of `s`
    pub fn max_slope_deg(&self) -> f64 {
        self.max_slope_deg
    }

    /// Largest change in angle between two consecutive steps when the cycle
    /// is `cycle_ticks` steps long.
    ///
    /// Units: degrees
    pub fn max_step_delta_deg(&self, cycle_ticks: u64) -> f64 {
        if cycle_ticks == 0 {
            return 0.0;
        }
        self.max_slope_deg / cycle_ticks as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn triangle() -> Profile {
        Profile::new(
            "test",
            &[
                Keyframe::new(0.0, 0.0),
                Keyframe::new(0.5, 10.0),
                Keyframe::new(1.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_eval_hits_keyframes() {
        let p = triangle();
        assert_eq!(p.eval(0.0), 0.0);
        assert_eq!(p.eval(0.5), 10.0);
        assert_eq!(p.eval(1.0), 0.0);
        assert_eq!(p.eval(0.25), 5.0);
    }

    #[test]
    fn test_eval_clamps() {
        let p = triangle();
        assert_eq!(p.eval(-1.0), 0.0);
        assert_eq!(p.eval(2.0), 0.0);
    }

    #[test]
    fn test_slope_bound() {
        let p = triangle();
        assert!((p.max_slope_deg() - 30.0).abs() < 1e-12);

        let n = 2000;
        let bound = p.max_step_delta_deg(n);
        let mut prev = p.eval(0.0);
        for i in 1..=n {
            let v = p.eval(i as f64 / n as f64);
            assert!((v - prev).abs() <= bound + 1e-9);
            prev = v;
        }
    }

    #[test]
    fn test_empty_profile_is_nan() {
        assert!(Profile::default().eval(0.3).is_nan());
    }

    #[test]
    fn test_invalid_keyframes() {
        let not_periodic = [Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)];
        assert!(Profile::new("test", &not_periodic).is_err());

        let not_spanning = [Keyframe::new(0.1, 0.0), Keyframe::new(1.0, 0.0)];
        assert!(Profile::new("test", &not_spanning).is_err());

        let not_increasing = [
            Keyframe::new(0.0, 0.0),
            Keyframe::new(0.6, 1.0),
            Keyframe::new(0.6, 2.0),
            Keyframe::new(1.0, 0.0),
        ];
        assert!(Profile::new("test", &not_increasing).is_err());

        let too_many = [Keyframe::new(0.0, 0.0); MAX_KEYFRAMES + 1];
        assert!(Profile::new("test", &too_many).is_err());
    }

    #[test]
    fn test_gait_profiles() {
        let params = Params::default();
        let hip = Profile::hip(&params).unwrap();
        let knee = Profile::knee(&params).unwrap();

        assert_eq!(hip.eval(0.0), params.hip_swing_start_deg);
        assert!((hip.eval(0.3) - params.max_hip_flexion_deg).abs() < 1e-9);
        assert!((hip.eval(0.5) - params.heel_strike_hip_deg()).abs() < 1e-9);
        assert!((hip.eval(1.0) - params.hip_swing_start_deg).abs() < 1e-9);

        assert_eq!(knee.eval(0.0), params.min_knee_flexion_deg);
        assert_eq!(knee.eval(0.3), params.max_knee_flexion_deg);
        assert_eq!(knee.eval(0.75), params.second_knee_flexion_deg);
    }
}
