//! # Piecewise Interpolation
//!
//! Shared lookup over ordered control points. Used by the Schwarz coefficient
//! curves (linear in normalized depth) and by the presumed touch-voltage
//! curves (log-log in time and voltage).
//!
//! ## Behavior
//!
//! - `x` at or below the first knot returns the first value unchanged
//! - `x` at or above the last knot returns the last value unchanged
//! - `x` exactly on an interior knot returns that knot's value unchanged
//! - otherwise the caller's `blend` mixes the two bracketing values
//!
//! Returning stored values untouched at the knots keeps tabulated endpoints
//! exact (no round-trip through `log10`/`powf`).

use serde::{Deserialize, Serialize};

/// Spacing used to compute the position of `x` between two knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Fraction measured on `x` directly
    Linear,
    /// Fraction measured on `log10(x)`; knots and `x` must be positive
    Log10,
}

impl Axis {
    fn map(self, x: f64) -> f64 {
        match self {
            Axis::Linear => x,
            Axis::Log10 => x.log10(),
        }
    }
}

/// A named control point on a piecewise curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Knot<T> {
    /// Label for reports (e.g., "Curve A")
    pub name: &'static str,
    /// Abscissa of the knot
    pub at: f64,
    /// Value at the knot
    pub value: T,
}

impl<T> Knot<T> {
    pub const fn new(name: &'static str, at: f64, value: T) -> Self {
        Self { name, at, value }
    }
}

/// Interpolate over knots sorted by ascending `at`.
///
/// `blend(lo, hi, s)` receives the bracketing values and the fraction
/// `s ∈ (0, 1)` measured along `axis`.
///
/// Returns `None` for an empty knot list or a non-finite `x`.
///
/// # Example
/// ```rust
/// use grid_core::equations::interpolate::{interpolate, lerp, Axis, Knot};
///
/// let knots = [Knot::new("a", 0.0, 10.0), Knot::new("b", 1.0, 20.0)];
/// assert_eq!(interpolate(&knots, 0.5, Axis::Linear, lerp), Some(15.0));
/// assert_eq!(interpolate(&knots, -3.0, Axis::Linear, lerp), Some(10.0));
/// assert_eq!(interpolate(&knots, 7.0, Axis::Linear, lerp), Some(20.0));
/// ```
pub fn interpolate<T, F>(knots: &[Knot<T>], x: f64, axis: Axis, blend: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T, &T, f64) -> T,
{
    if !x.is_finite() {
        return None;
    }
    let first = knots.first()?;
    let last = knots.last()?;

    if x <= first.at {
        return Some(first.value.clone());
    }
    if x >= last.at {
        return Some(last.value.clone());
    }

    for pair in knots.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if x == lo.at {
            return Some(lo.value.clone());
        }
        if x > lo.at && x < hi.at {
            let span = axis.map(hi.at) - axis.map(lo.at);
            if span == 0.0 {
                return Some(lo.value.clone());
            }
            let s = (axis.map(x) - axis.map(lo.at)) / span;
            return Some(blend(&lo.value, &hi.value, s));
        }
    }

    Some(last.value.clone())
}

/// Linear blend of two scalars.
#[inline]
pub fn lerp(a: &f64, b: &f64, s: f64) -> f64 {
    a + s * (b - a)
}

/// Blend two positive scalars linearly in `log10` space.
///
/// Falls back to [`lerp`] when either value is not positive.
#[inline]
pub fn log_lerp(a: &f64, b: &f64, s: f64) -> f64 {
    if *a <= 0.0 || *b <= 0.0 {
        return lerp(a, b, s);
    }
    let (la, lb) = (a.log10(), b.log10());
    10f64.powf(la + s * (lb - la))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVE: [Knot<f64>; 3] = [
        Knot::new("low", 0.0, 0.0),
        Knot::new("mid", 0.1, 1.0),
        Knot::new("high", 0.2, 4.0),
    ];

    #[test]
    fn test_clamps_outside_range() {
        assert_eq!(interpolate(&CURVE, -1.0, Axis::Linear, lerp), Some(0.0));
        assert_eq!(interpolate(&CURVE, 5.0, Axis::Linear, lerp), Some(4.0));
    }

    #[test]
    fn test_exact_knots() {
        assert_eq!(interpolate(&CURVE, 0.1, Axis::Linear, lerp), Some(1.0));
        assert_eq!(interpolate(&CURVE, 0.2, Axis::Linear, lerp), Some(4.0));
    }

    #[test]
    fn test_linear_between_knots() {
        let v = interpolate(&CURVE, 0.15, Axis::Linear, lerp).unwrap();
        assert!((v - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_log_midpoint() {
        let knots = [Knot::new("a", 1.0, 100.0), Knot::new("b", 100.0, 1.0)];
        // Midpoint in log(t) is t = 10; midpoint in log(v) is v = 10.
        let v = interpolate(&knots, 10.0, Axis::Log10, log_lerp).unwrap();
        assert!((v - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_non_finite() {
        let empty: [Knot<f64>; 0] = [];
        assert_eq!(interpolate(&empty, 1.0, Axis::Linear, lerp), None);
        assert_eq!(interpolate(&CURVE, f64::NAN, Axis::Linear, lerp), None);
    }
}
