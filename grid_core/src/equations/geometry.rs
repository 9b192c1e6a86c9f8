//! # Geometric Correction Factors
//!
//! Factors that turn grid current and soil resistivity into mesh touch and
//! step voltages.
//!
//! ## Notation
//!
//! - `D` = Spacing between parallel conductors (m)
//! - `h` = Burial depth (m)
//! - `d` = Conductor diameter (m)
//! - `n` = Effective number of parallel conductors
//! - `Ki` = Irregularity factor
//! - `Km` = Mesh (touch) geometry factor
//! - `Ks` = Step geometry factor

use std::f64::consts::PI;

/// Irregularity factor Ki.
///
/// # Formula
/// Ki = 0.656 + 0.172·n
#[inline]
pub fn irregularity_factor(n: f64) -> f64 {
    0.656 + 0.172 * n
}

/// Mesh geometry factor Km for the touch voltage.
///
/// # Formula
/// ```text
/// Kii = 1                  with rods on the perimeter
///     = (2n)^(-2/n)        otherwise
/// Kh  = √(1 + h)
/// Km  = (1/2π)·[ln(D²/(16hd) + (D+2h)²/(8Dd) − h/(4d)) + (Kii/Kh)·ln(8/(π(2n−1)))]
/// ```
///
/// Returns 0 if any of D, h, d is not positive or n ≤ 0.5.
///
/// # Example
/// ```rust
/// use grid_core::equations::geometry::touch_geometry_factor;
///
/// let km = touch_geometry_factor(5.0, 0.5, 0.00798, 9.89, false);
/// assert!((km - 0.8435).abs() < 1e-3);
/// ```
pub fn touch_geometry_factor(spacing_m: f64, depth_m: f64, diameter_m: f64, n: f64, has_perimeter_rods: bool) -> f64 {
    let (d_sp, h, d, n) = (spacing_m, depth_m, diameter_m, n);
    if d_sp <= 0.0 || h <= 0.0 || d <= 0.0 || 2.0 * n - 1.0 <= 0.0 {
        return 0.0;
    }

    let kii = if has_perimeter_rods {
        1.0
    } else {
        (2.0 * n).powf(-2.0 / n)
    };
    let kh = (1.0 + h).sqrt();

    let spacing_term = d_sp * d_sp / (16.0 * h * d) + (d_sp + 2.0 * h).powi(2) / (8.0 * d_sp * d) - h / (4.0 * d);
    let count_term = (kii / kh) * (8.0 / (PI * (2.0 * n - 1.0))).ln();

    (spacing_term.ln() + count_term) / (2.0 * PI)
}

/// Step geometry factor Ks.
///
/// Intended for 0.25 m < h < 2.25 m; the range is not enforced here.
///
/// # Formula
/// Ks = (1/π)·[1/(2h) + 1/(D+h) + (1/D)·(1 − 0.5^(n−2))]
///
/// Returns 0 if any of D, h, n is not positive.
pub fn step_geometry_factor(spacing_m: f64, depth_m: f64, n: f64) -> f64 {
    if spacing_m <= 0.0 || depth_m <= 0.0 || n <= 0.0 {
        return 0.0;
    }
    let h = depth_m;
    let d_sp = spacing_m;
    (1.0 / (2.0 * h) + 1.0 / (d_sp + h) + (1.0 - 0.5f64.powf(n - 2.0)) / d_sp) / PI
}

/// Mesh touch voltage Em (V).
///
/// # Formula
/// Em = ρ·Im·Km·Ki / Lt
///
/// `current_a` in amperes. Returns 0 if Lt ≤ 0.
#[inline]
pub fn mesh_touch_voltage(rho: f64, current_a: f64, km: f64, ki: f64, total_length_m: f64) -> f64 {
    if total_length_m <= 0.0 {
        return 0.0;
    }
    rho * current_a * km * ki / total_length_m
}

/// Mesh step voltage Es (V).
///
/// # Formula
/// Es = ρ·Im·Ks·Ki / Lt
///
/// Returns 0 if Lt ≤ 0.
#[inline]
pub fn mesh_step_voltage(rho: f64, current_a: f64, ks: f64, ki: f64, total_length_m: f64) -> f64 {
    if total_length_m <= 0.0 {
        return 0.0;
    }
    rho * current_a * ks * ki / total_length_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const N_REF: f64 = 890.0 / 90.0;
    const D_REF: f64 = 0.007_978_845_608;

    #[test]
    fn test_irregularity_factor() {
        assert_relative_eq!(irregularity_factor(N_REF), 2.356889, max_relative = 1e-6);
        assert!((irregularity_factor(0.0) - 0.656).abs() < 1e-12);
    }

    #[test]
    fn test_touch_factor_reference_grid() {
        let km = touch_geometry_factor(5.0, 0.5, D_REF, N_REF, false);
        assert_relative_eq!(km, 0.843502, max_relative = 1e-5);
    }

    #[test]
    fn test_perimeter_rods_lower_touch_factor() {
        let without = touch_geometry_factor(5.0, 0.5, D_REF, N_REF, false);
        let with = touch_geometry_factor(5.0, 0.5, D_REF, N_REF, true);
        assert_relative_eq!(with, 0.725843, max_relative = 1e-5);
        assert!(with < without);
    }

    #[test]
    fn test_touch_factor_below_one_conductor() {
        for n in [0.3, 0.5] {
            let km = touch_geometry_factor(5.0, 0.5, 0.008, n, false);
            assert!(km.is_finite());
            assert_eq!(km, 0.0);
        }
        assert!(touch_geometry_factor(5.0, 0.5, 0.008, 0.6, false).is_finite());
    }

    #[test]
    fn test_touch_factor_invalid() {
        assert_eq!(touch_geometry_factor(0.0, 0.5, D_REF, N_REF, false), 0.0);
        assert_eq!(touch_geometry_factor(5.0, 0.0, D_REF, N_REF, false), 0.0);
        assert_eq!(touch_geometry_factor(5.0, 0.5, -1.0, N_REF, false), 0.0);
        assert_eq!(touch_geometry_factor(5.0, 0.5, D_REF, 0.0, true), 0.0);
    }

    #[test]
    fn test_step_factor_reference_grid() {
        let ks = step_geometry_factor(5.0, 0.5, N_REF);
        assert_relative_eq!(ks, 0.439578, max_relative = 1e-5);
        assert_eq!(step_geometry_factor(5.0, -0.5, N_REF), 0.0);
    }

    #[test]
    fn test_mesh_voltages() {
        // 100 Ω·m, 1000 A, Km = 1, Ki = 1, Lt = 100 m -> 1000 V
        assert!((mesh_touch_voltage(100.0, 1000.0, 1.0, 1.0, 100.0) - 1000.0).abs() < 1e-9);
        assert!((mesh_step_voltage(100.0, 1000.0, 0.5, 2.0, 100.0) - 1000.0).abs() < 1e-9);
        assert_eq!(mesh_touch_voltage(100.0, 1000.0, 1.0, 1.0, 0.0), 0.0);
        assert_eq!(mesh_step_voltage(100.0, 1000.0, 1.0, 1.0, -5.0), 0.0);
    }
}
