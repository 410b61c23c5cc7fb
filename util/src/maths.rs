//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Cubic Hermite blend with zero slope at both ends, `3u^2 - 2u^3`.
///
/// `u` is clamped into `[0, 1]` first so the result always lies in `[0, 1]`.
pub fn smoothstep<T>(u: T) -> T
where
    T: Float,
{
    let zero = T::zero();
    let one = T::one();
    let two = one + one;
    let three = two + one;

    let u = clamp(&u, &zero, &one);

    u * u * (three - two * u)
}

/// Largest slope of `smoothstep` over `[0, 1]`, reached at `u = 0.5`.
pub const SMOOTHSTEP_MAX_SLOPE: f64 = 1.5;

/// Interpolate between `start` and `end` using `smoothstep`, `u` is the fraction of the way
/// through the segment.
pub fn smooth_interp<T>(start: T, end: T, u: T) -> T
where
    T: Float,
{
    start + (end - start) * smoothstep(u)
}
