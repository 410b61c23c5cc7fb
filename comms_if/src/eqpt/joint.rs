//! # Joint Demands
//!
//! The angle demands produced once per generation step for the leg joints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of actuated joints on the device.
pub const NUM_JOINTS: usize = 4;

const JOINT_IDS: [JointId; NUM_JOINTS] = [
    JointId::HipLeft,
    JointId::KneeLeft,
    JointId::HipRight,
    JointId::KneeRight,
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all joints driven by the trajectory core.
///
/// The discriminant is the joint's index into an `AngleSet`.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum JointId {
    HipLeft = 0,
    KneeLeft = 1,
    HipRight = 2,
    KneeRight = 3,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A complete snapshot of the commanded angles for every joint.
///
/// The set is `Copy` so that it can be handed over as a whole, consumers never hold a reference
/// into a set that is being updated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AngleSet {
    /// The walking (trunk) offset angle the hip streams are built on.
    ///
    /// Units: degrees
    pub walking_angle_deg: f64,

    /// Commanded angle of each joint, indexed by `JointId`.
    ///
    /// Units: degrees
    pub angles_deg: [f64; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joint IDs, in `AngleSet` order.
    pub fn all() -> &'static [JointId; NUM_JOINTS] {
        &JOINT_IDS
    }

    /// Index of this joint inside an `AngleSet`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JointId::HipLeft => "hip_l",
            JointId::KneeLeft => "knee_l",
            JointId::HipRight => "hip_r",
            JointId::KneeRight => "knee_r",
        };
        write!(f, "{}", s)
    }
}

impl Default for AngleSet {
    fn default() -> Self {
        Self {
            walking_angle_deg: 0.0,
            angles_deg: [0.0; NUM_JOINTS],
        }
    }
}

impl AngleSet {
    /// Get the commanded angle of a joint.
    pub fn get(&self, joint: JointId) -> f64 {
        self.angles_deg[joint.index()]
    }

    /// Set the commanded angle of a joint.
    pub fn set(&mut self, joint: JointId, angle_deg: f64) {
        self.angles_deg[joint.index()] = angle_deg;
    }

    /// Iterate over `(JointId, angle)` pairs in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, f64)> + '_ {
        JointId::all()
            .iter()
            .map(move |id| (*id, self.angles_deg[id.index()]))
    }

    /// True if every angle in the set is a finite number.
    pub fn is_finite(&self) -> bool {
        self.walking_angle_deg.is_finite() && self.angles_deg.iter().all(|a| a.is_finite())
    }

    /// Largest absolute per-joint difference between this set and `other`.
    pub fn max_abs_diff(&self, other: &AngleSet) -> f64 {
        self.angles_deg
            .iter()
            .zip(other.angles_deg.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for AngleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "walk {:+.3}", self.walking_angle_deg)?;
        for (id, angle) in self.iter() {
            write!(f, ", {} {:+.3}", id, angle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_index_order() {
        for (i, id) in JointId::all().iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_angle_set_access() {
        let mut set = AngleSet::default();
        set.set(JointId::KneeRight, 12.5);
        set.set(JointId::HipLeft, -3.0);

        assert_eq!(set.get(JointId::KneeRight), 12.5);
        assert_eq!(set.get(JointId::HipLeft), -3.0);
        assert_eq!(set.get(JointId::KneeLeft), 0.0);
        assert!(set.is_finite());

        set.set(JointId::HipRight, f64::NAN);
        assert!(!set.is_finite());
    }

    #[test]
    fn test_max_abs_diff() {
        let a = AngleSet {
            walking_angle_deg: 0.0,
            angles_deg: [1.0, 2.0, 3.0, 4.0],
        };
        let b = AngleSet {
            walking_angle_deg: 0.0,
            angles_deg: [1.5, 0.0, 3.0, 4.25],
        };
        assert_eq!(a.max_abs_diff(&b), 2.0);
        assert_eq!(a.max_abs_diff(&a), 0.0);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let set = AngleSet {
            walking_angle_deg: 2.0,
            angles_deg: [10.0, 20.0, 30.0, 40.0],
        };
        let json = serde_json::to_string(&set).unwrap();
        let back: AngleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }
}
