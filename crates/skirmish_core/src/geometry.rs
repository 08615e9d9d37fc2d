//! Flat-world geometry helpers.
//!
//! Positions and facings are `f64`: unit positions are authoritative
//! floating-point accumulators, and only the [`Action`](crate::action::Action)
//! stream quantizes them to integers for the wire. Facings are degrees in
//! `[0, 360)` with `0` pointing along +X and angles growing counterclockwise.

use serde::{Deserialize, Serialize};

/// 2D position or displacement in world distance units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let d = other - self;
        d.x * d.x + d.y * d.y
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Quantize to integer wire coordinates (round half away from zero).
    ///
    /// Presentation only: the simulation never reads these back, so the
    /// rounding cannot feed into authoritative state.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantized(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Bearing in degrees from `from` toward `to`.
///
/// Coincident points yield bearing `0.0`.
#[must_use]
pub fn bearing_to(from: Vec2, to: Vec2) -> f64 {
    let d = to - from;
    if d.x == 0.0 && d.y == 0.0 {
        return 0.0;
    }
    normalize_degrees(d.y.atan2(d.x).to_degrees())
}

/// Signed shortest angular difference `target - current`, in `[-180, 180]`.
#[must_use]
pub fn angle_delta(current: f64, target: f64) -> f64 {
    let mut delta = normalize_degrees(target) - normalize_degrees(current);
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Rotate `current` toward `target` by at most `max_step` degrees.
///
/// Returns the target itself once the remaining delta fits inside the step,
/// so callers can test exact alignment with `==`.
#[must_use]
pub fn rotate_toward(current: f64, target: f64, max_step: f64) -> f64 {
    let delta = angle_delta(current, target);
    if delta.abs() <= max_step {
        normalize_degrees(target)
    } else {
        normalize_degrees(current + max_step.copysign(delta))
    }
}

/// Advance `pos` toward `dest` by `dist`, stopping exactly at `dest`.
#[must_use]
pub fn step_toward(pos: Vec2, dest: Vec2, dist: f64) -> Vec2 {
    let gap = pos.distance(dest);
    if gap <= dist || gap == 0.0 {
        return dest;
    }
    pos + (dest - pos) * (dist / gap)
}

/// Point `dist` away from `pos` along `bearing` degrees.
#[must_use]
pub fn point_at(pos: Vec2, bearing: f64, dist: f64) -> Vec2 {
    let rad = bearing.to_radians();
    pos + Vec2::new(rad.cos(), rad.sin()) * dist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_bearing_cardinals() {
        let origin = Vec2::ZERO;
        assert!(approx(bearing_to(origin, Vec2::new(10.0, 0.0)), 0.0));
        assert!(approx(bearing_to(origin, Vec2::new(0.0, 10.0)), 90.0));
        assert!(approx(bearing_to(origin, Vec2::new(-10.0, 0.0)), 180.0));
        assert!(approx(bearing_to(origin, Vec2::new(0.0, -10.0)), 270.0));
    }

    #[test]
    fn test_bearing_coincident_points() {
        let p = Vec2::new(5.0, 5.0);
        assert!(approx(bearing_to(p, p), 0.0));
    }

    #[test]
    fn test_angle_delta_wraps_shortest_way() {
        assert!(approx(angle_delta(350.0, 10.0), 20.0));
        assert!(approx(angle_delta(10.0, 350.0), -20.0));
        assert!(approx(angle_delta(0.0, 180.0), 180.0));
    }

    #[test]
    fn test_rotate_toward_clamps_then_aligns() {
        // 90 degrees away, 30 degrees per step: three steps to align
        let mut facing = 0.0;
        facing = rotate_toward(facing, 90.0, 30.0);
        assert!(approx(facing, 30.0));
        facing = rotate_toward(facing, 90.0, 30.0);
        assert!(approx(facing, 60.0));
        facing = rotate_toward(facing, 90.0, 30.0);
        assert!(approx(facing, 90.0));
        // Already aligned: stays put
        assert!(approx(rotate_toward(facing, 90.0, 30.0), 90.0));
    }

    #[test]
    fn test_rotate_toward_crosses_zero() {
        // Shortest path from 350 to 10 goes through 0, not back through 180
        let facing = rotate_toward(350.0, 10.0, 45.0);
        assert!(approx(facing, 10.0));
        let facing = rotate_toward(350.0, 10.0, 5.0);
        assert!(approx(facing, 355.0));
    }

    #[test]
    fn test_step_toward_no_overshoot() {
        let pos = Vec2::ZERO;
        let dest = Vec2::new(10.0, 0.0);
        let step = step_toward(pos, dest, 4.0);
        assert!(approx(step.x, 4.0));
        let arrived = step_toward(Vec2::new(9.0, 0.0), dest, 4.0);
        assert_eq!(arrived, dest);
    }

    #[test]
    fn test_point_at_opposite_facing() {
        // Withdrawing away from facing 0 lands 200 units along -X
        let pos = Vec2::new(100.0, 50.0);
        let behind = point_at(pos, normalize_degrees(0.0 + 180.0), 200.0);
        assert!(approx(behind.x, -100.0));
        assert!(approx(behind.y, 50.0));
    }

    #[test]
    fn test_quantized_rounds() {
        assert_eq!(Vec2::new(1.4, -1.6).quantized(), (1, -2));
        assert_eq!(Vec2::new(2.5, 0.0).quantized(), (3, 0));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_normalize_lands_in_range(angle in -1e6f64..1e6) {
            let n = normalize_degrees(angle);
            prop_assert!((0.0..360.0).contains(&n));
        }

        #[test]
        fn test_rotate_toward_never_increases_delta(
            current in 0.0f64..360.0,
            target in 0.0f64..360.0,
            step in 0.1f64..180.0,
        ) {
            let next = rotate_toward(current, target, step);
            let before = angle_delta(current, target).abs();
            let after = angle_delta(next, target).abs();
            prop_assert!(after <= before + 1e-9);
        }

        #[test]
        fn test_step_toward_never_increases_gap(
            x in -1e3f64..1e3,
            y in -1e3f64..1e3,
            dist in 0.0f64..100.0,
        ) {
            let dest = Vec2::new(x, y);
            let next = step_toward(Vec2::ZERO, dest, dist);
            prop_assert!(next.distance(dest) <= Vec2::ZERO.distance(dest) + 1e-9);
        }
    }
}
