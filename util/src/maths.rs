//! Utility maths functions
//!
//! Headings throughout the vehicle software are in degrees, so the angle helpers here work in
//! degrees too.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap an angle in degrees into the range (-180, 180].
pub fn wrap_deg<T>(angle: T) -> T
where
    T: Float
{
    let half_turn = T::from(180.0).unwrap();
    let full_turn = T::from(360.0).unwrap();

    let wrapped = rem_euclid(angle + half_turn, full_turn) - half_turn;

    if wrapped <= -half_turn {
        wrapped + full_turn
    }
    else {
        wrapped
    }
}

/// Get the signed shortest angular distance from `b` to `a` in degrees.
///
/// The result is in (-180, 180], positive when `a` is reached from `b` by increasing the angle.
pub fn ang_dist_deg<T>(a: T, b: T) -> T
where
    T: Float
{
    wrap_deg(a - b)
}

/// Map an angle in degrees into the range [0, 360).
pub fn norm_deg<T>(angle: T) -> T
where
    T: Float
{
    let full_turn = T::from(360.0).unwrap();

    let r = rem_euclid(angle, full_turn);

    // Round off can land exactly on a full turn
    if r >= full_turn {
        T::zero()
    }
    else {
        r
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `self` is much smaller than `rhs.abs()` in
/// magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrap_deg() {
        assert_eq!(wrap_deg(0f64), 0f64);
        assert_eq!(wrap_deg(180f64), 180f64);
        assert_eq!(wrap_deg(-180f64), 180f64);
        assert_eq!(wrap_deg(190f64), -170f64);
        assert_eq!(wrap_deg(-350f64), 10f64);
        assert_eq!(wrap_deg(720f64), 0f64);
    }

    #[test]
    fn test_ang_dist_deg() {
        assert_eq!(ang_dist_deg(10f64, 350f64), 20f64);
        assert_eq!(ang_dist_deg(350f64, 10f64), -20f64);
        assert_eq!(ang_dist_deg(0f64, 360f64), 0f64);
        assert_eq!(ang_dist_deg(90f64, 0f64), 90f64);
        assert_eq!(ang_dist_deg(270f64, 0f64), -90f64);
    }

    #[test]
    fn test_norm_deg() {
        assert_eq!(norm_deg(-10f64), 350f64);
        assert_eq!(norm_deg(725f64), 5f64);
        assert_eq!(norm_deg(360f64), 0f64);
        assert_eq!(norm_deg(-1e-20f64), 0f64);
    }
}
