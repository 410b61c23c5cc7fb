//! # Angle Output
//!
//! Latest commanded angles, shared with actuator consumers. The whole
//! `AngleSet` is replaced and copied under one lock so a reader never sees
//! angles from two different steps.

use std::sync::{Arc, Mutex};

use comms_if::eqpt::joint::AngleSet;

/// Cloneable handle to the latest commanded angles.
#[derive(Clone, Default)]
pub struct AngleOutput {
    latest: Arc<Mutex<AngleSet>>,
}

impl AngleOutput {
    pub fn new(initial: AngleSet) -> Self {
        Self {
            latest: Arc::new(Mutex::new(initial)),
        }
    }

    /// Replace the published angles.
    pub fn publish(&self, angles: &AngleSet) {
        // An AngleSet is only ever written whole, so a poisoned lock still
        // holds a consistent set
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *latest = *angles;
    }

    /// Copy out the published angles.
    pub fn snapshot(&self) -> AngleSet {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::joint::{JointId, NUM_JOINTS};
    use std::thread;

    #[test]
    fn test_publish_snapshot() {
        let out = AngleOutput::default();
        assert_eq!(out.snapshot(), AngleSet::default());

        let mut a = AngleSet::default();
        a.set(JointId::KneeRight, 12.5);
        out.publish(&a);

        let reader = out.clone();
        assert_eq!(reader.snapshot(), a);
    }

    #[test]
    fn test_no_mixed_sets() {
        let out = AngleOutput::default();
        let writer = out.clone();

        // Every published set holds the same value in every joint
        let jh = thread::spawn(move || {
            for i in 0..10_000 {
                let v = i as f64;
                writer.publish(&AngleSet {
                    walking_angle_deg: v,
                    angles_deg: [v; NUM_JOINTS],
                });
            }
        });

        for _ in 0..10_000 {
            let s = out.snapshot();
            assert!(s.angles_deg.iter().all(|&v| v == s.walking_angle_deg));
        }

        jh.join().unwrap();
    }
}
