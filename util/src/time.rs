//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Number of whole periods of length `period_s` that fit in `duration_s`, rounded to the nearest
/// period.
///
/// Returns `None` if either value is not finite and positive or the result does not fit in a
/// `u64`.
pub fn seconds_to_ticks(duration_s: f64, period_s: f64) -> Option<u64> {
    if !(duration_s.is_finite() && period_s.is_finite()) || duration_s <= 0.0 || period_s <= 0.0 {
        return None;
    }

    let ticks = (duration_s / period_s).round();

    if ticks < 1.0 || ticks > u64::MAX as f64 {
        None
    } else {
        Some(ticks as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        let d = chrono::Duration::milliseconds(1500);
        assert_eq!(duration_to_seconds(d), Some(1.5));
    }

    #[test]
    fn test_seconds_to_ticks() {
        assert_eq!(seconds_to_ticks(1.0, 0.001), Some(1000));
        assert_eq!(seconds_to_ticks(0.5, 0.001), Some(500));
        assert_eq!(seconds_to_ticks(1.0, 0.0), None);
        assert_eq!(seconds_to_ticks(-1.0, 0.001), None);
        assert_eq!(seconds_to_ticks(f64::NAN, 0.001), None);
        assert_eq!(seconds_to_ticks(0.0001, 0.001), None);
    }
}
