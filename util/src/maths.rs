//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise an angle into the range (-pi, pi].
///
/// Exactly -pi maps to +pi, so the returned value is never -pi itself.
pub fn norm_pi<T>(angle: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();

    let r = rem_euclid(angle, tau_t);

    if r > pi_t {
        r - tau_t
    } else {
        r
    }
}

/// Get the signed shortest angular distance from `a` to `b`.
///
/// Both angles may be arbitrary; the result lies in (-pi, pi].
pub fn ang_dist_pi<T>(a: T, b: T) -> T
where
    T: Float,
{
    norm_pi(b - a)
}

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value between a minimum and maximum.
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

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_norm_pi() {
        assert_eq!(norm_pi(0f64), 0f64);
        assert_eq!(norm_pi(PI), PI);
        assert_eq!(norm_pi(-PI), PI);
        assert_eq!(norm_pi(TAU), 0f64);
        assert!((norm_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((norm_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);

        // Values just over the wrap boundary must come back just inside it
        let eps = 1e-9;
        assert!(norm_pi(PI + eps) < 0.0);
        assert!(norm_pi(PI + eps) > -PI);
    }

    #[test]
    fn test_ang_dist_pi() {
        assert_eq!(ang_dist_pi(1f64, 2f64), 1f64);
        assert_eq!(ang_dist_pi(2f64, 1f64), -1f64);
        assert!((ang_dist_pi(0.1, TAU - 0.1) + 0.2).abs() < 1e-12);
        assert!((ang_dist_pi(TAU - 0.1, 0.1) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&2.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.5, &-1.0, &1.0), 0.5);
    }
}
