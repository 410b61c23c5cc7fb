//! # Heartbeat
//!
//! A debug indicator toggled from the tick callback every fixed number of
//! ticks. Only the tick callback writes it, the main loop only reads it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tick counter driving the heartbeat indicator.
pub struct Heartbeat {
    count: u64,
    period_ticks: u64,
    indicator: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("The heartbeat period must be at least one tick")]
    ZeroPeriod,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Heartbeat {
    pub fn new(period_ticks: u64) -> Result<Self, HeartbeatError> {
        if period_ticks == 0 {
            return Err(HeartbeatError::ZeroPeriod);
        }

        Ok(Self {
            count: 0,
            period_ticks,
            indicator: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a handle to the indicator, for reading from another context.
    pub fn indicator(&self) -> Arc<AtomicBool> {
        self.indicator.clone()
    }

    /// Count one tick.
    ///
    /// Returns the new indicator state if it toggled on this tick. Constant
    /// time, never allocates or blocks.
    pub fn on_tick(&mut self) -> Option<bool> {
        self.count = self.count.wrapping_add(1);

        if self.count % self.period_ticks == 0 {
            let prev = self.indicator.fetch_xor(true, Ordering::Relaxed);
            Some(!prev)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_toggles_every_period() {
        let mut hb = Heartbeat::new(3).unwrap();
        let indicator = hb.indicator();

        assert_eq!(hb.on_tick(), None);
        assert_eq!(hb.on_tick(), None);
        assert_eq!(hb.on_tick(), Some(true));
        assert!(indicator.load(Ordering::Relaxed));

        assert_eq!(hb.on_tick(), None);
        assert_eq!(hb.on_tick(), None);
        assert_eq!(hb.on_tick(), Some(false));
        assert!(!indicator.load(Ordering::Relaxed));
    }

    #[test]
    fn test_counter_wraps() {
        let mut hb = Heartbeat::new(1).unwrap();
        hb.count = u64::MAX;

        // Wraps to zero, which is a multiple of every period
        assert_eq!(hb.on_tick(), Some(true));
        assert_eq!(hb.count, 0);
    }

    #[test]
    fn test_zero_period() {
        assert!(Heartbeat::new(0).is_err());
    }
}
