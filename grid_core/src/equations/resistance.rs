//! # Grid Resistance Formulas
//!
//! Three interchangeable estimates of the grounding resistance of a
//! horizontal grid, optionally combined with vertical rods.
//!
//! | Method | Name           | Intended burial depth |
//! |--------|----------------|-----------------------|
//! | A      | Laurent-Niemann| h ≤ 0.25 m            |
//! | B      | Sverak         | 0.25 m < h < 2.5 m    |
//! | C      | Schwarz        | any (grid + rods)     |
//!
//! ## Notation
//!
//! - `ρ` = Soil (apparent) resistivity (Ω·m)
//! - `A` = Area occupied by the grid (m²)
//! - `Lt` = Total buried conductor length (m)
//! - `Lc` = Total length of grid conductors (m)
//! - `h` = Burial depth (m)
//! - `nr`, `Lr`, `b` = Rod count, rod length (m), rod radius (m)
//!
//! ## Schwarz coefficients
//!
//! k1 and k2 come from three reference curves indexed by the normalized
//! depth h/√A. Each curve is linear in the length/width ratio x = L/W:
//!
//! ```text
//! Curve A (h/√A = 0):    k1 = -0.04x + 1.41   k2 =  0.15x + 5.50
//! Curve B (h/√A = 1/10): k1 = -0.05x + 1.20   k2 =  0.10x + 4.68
//! Curve C (h/√A = 1/6):  k1 = -0.05x + 1.13   k2 = -0.05x + 4.40
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::interpolate::{interpolate, Axis, Knot};
use super::soil::equivalent_radius;

// =============================================================================
// METHOD A: LAURENT-NIEMANN
// =============================================================================

/// Simplified grid resistance for shallow grids (Method A).
///
/// # Formula
/// R = ρ/(4r) + ρ/Lt, with r = √(A/π)
///
/// Returns 0 on any non-positive input.
///
/// # Example
/// ```rust
/// use grid_core::equations::resistance::laurent_niemann_resistance;
///
/// let r = laurent_niemann_resistance(100.0, 2000.0, 890.0);
/// assert!((r - 1.1032).abs() < 1e-3);
/// ```
pub fn laurent_niemann_resistance(rho: f64, area_m2: f64, total_length_m: f64) -> f64 {
    if rho <= 0.0 || area_m2 <= 0.0 || total_length_m <= 0.0 {
        return 0.0;
    }
    let r = equivalent_radius(area_m2);
    rho / (4.0 * r) + rho / total_length_m
}

// =============================================================================
// METHOD B: SVERAK
// =============================================================================

/// Grid resistance including the burial-depth correction (Method B).
///
/// # Formula
/// R = ρ·[1/Lt + (1/√(20A))·(1 + 1/(1 + h√(20/A)))]
///
/// Returns 0 on non-positive ρ, A or Lt; a negative depth is treated as 0.
///
/// # Example
/// ```rust
/// use grid_core::equations::resistance::sverak_resistance;
///
/// // 50 m x 40 m grid, 11 x 9 conductors, 0.5 m deep, 100 Ω·m soil
/// let r = sverak_resistance(100.0, 2000.0, 890.0, 0.5);
/// assert!((r - 1.08855).abs() < 1e-5);
/// ```
pub fn sverak_resistance(rho: f64, area_m2: f64, total_length_m: f64, depth_m: f64) -> f64 {
    if rho <= 0.0 || area_m2 <= 0.0 || total_length_m <= 0.0 {
        return 0.0;
    }
    let h = depth_m.max(0.0);
    let depth_term = 1.0 + 1.0 / (1.0 + h * (20.0 / area_m2).sqrt());
    rho * (1.0 / total_length_m + depth_term / (20.0 * area_m2).sqrt())
}

// =============================================================================
// METHOD C: SCHWARZ (GRID + RODS)
// =============================================================================

/// Linear model `slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One Schwarz reference curve: k1 and k2 as functions of L/W.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchwarzCurve {
    pub k1: LinearModel,
    pub k2: LinearModel,
}

/// Schwarz reference curves keyed by normalized depth h/√A.
pub const SCHWARZ_CURVES: [Knot<SchwarzCurve>; 3] = [
    Knot::new(
        "Curve A",
        0.0,
        SchwarzCurve {
            k1: LinearModel::new(-0.04, 1.41),
            k2: LinearModel::new(0.15, 5.50),
        },
    ),
    Knot::new(
        "Curve B",
        0.1,
        SchwarzCurve {
            k1: LinearModel::new(-0.05, 1.20),
            k2: LinearModel::new(0.10, 4.68),
        },
    ),
    Knot::new(
        "Curve C",
        1.0 / 6.0,
        SchwarzCurve {
            k1: LinearModel::new(-0.05, 1.13),
            k2: LinearModel::new(-0.05, 4.40),
        },
    ),
];

/// Schwarz shape coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SchwarzCoefficients {
    pub k1: f64,
    pub k2: f64,
}

/// k1 and k2 for a grid with the given normalized depth (h/√A) and
/// length/width ratio.
///
/// Below 0 the values of curve A apply, above 1/6 those of curve C;
/// in between the two neighbouring curves are blended linearly.
pub fn schwarz_coefficients(normalized_depth: f64, length_width_ratio: f64) -> SchwarzCoefficients {
    let evaluated: Vec<Knot<SchwarzCoefficients>> = SCHWARZ_CURVES
        .iter()
        .map(|knot| {
            Knot::new(
                knot.name,
                knot.at,
                SchwarzCoefficients {
                    k1: knot.value.k1.eval(length_width_ratio),
                    k2: knot.value.k2.eval(length_width_ratio),
                },
            )
        })
        .collect();

    interpolate(&evaluated, normalized_depth, Axis::Linear, |a, b, s| SchwarzCoefficients {
        k1: a.k1 + s * (b.k1 - a.k1),
        k2: a.k2 + s * (b.k2 - a.k2),
    })
    .unwrap_or_default()
}

/// Inputs of the Schwarz method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchwarzParams {
    /// Soil resistivity ρ (Ω·m)
    pub resistivity: f64,
    /// Grid area A (m²)
    pub area_m2: f64,
    /// Length/width ratio of the grid (L ≥ W)
    pub length_width_ratio: f64,
    /// Total grid conductor length Lc (m)
    pub conductor_length_m: f64,
    /// Burial depth h (m)
    pub depth_m: f64,
    /// Grid conductor diameter (m)
    pub conductor_diameter_m: f64,
    /// Number of rods nr
    pub rod_count: usize,
    /// Rod length Lr (m)
    pub rod_length_m: f64,
    /// Rod diameter (m)
    pub rod_diameter_m: f64,
}

/// Output of the Schwarz method.
///
/// With no rods, `resistance == r1` and `r2 == r12 == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SchwarzResult {
    /// Combined grid + rods resistance Rg (Ω)
    pub resistance: f64,
    pub k1: f64,
    pub k2: f64,
    /// Grid-only resistance R1 (Ω)
    pub r1: f64,
    /// Rods-only resistance R2 (Ω)
    pub r2: f64,
    /// Mutual resistance R12 (Ω)
    pub r12: f64,
}

/// Combined grid and rod resistance (Method C).
///
/// # Formulas
/// ```text
/// a'  = √(a · 2h)                 a = conductor radius
/// R1  = ρ/(π·Lc) · [ln(2Lc/a') + k1·Lc/√A − k2]
/// R2  = ρ/(2π·nr·Lr) · [ln(4Lr/b) − 1 + (2k1·Lr/√A)·(√nr − 1)²]
/// R12 = ρ/(π·Lc) · [ln(2Lc/Lr) + k1·Lc/√A − k2 + 1]
/// Rg  = (R1·R2 − R12²) / (R1 + R2 − 2R12)
/// ```
///
/// A zero denominator in Rg falls back to R1. Non-positive resistivity,
/// area, conductor length, depth or diameter give an all-zero result.
///
/// # Example
/// ```rust
/// use grid_core::equations::resistance::{schwarz_resistance, SchwarzParams};
///
/// let result = schwarz_resistance(&SchwarzParams {
///     resistivity: 100.0,
///     area_m2: 2000.0,
///     length_width_ratio: 1.25,
///     conductor_length_m: 890.0,
///     depth_m: 0.5,
///     conductor_diameter_m: 0.00798,
///     rod_count: 0,
///     rod_length_m: 0.0,
///     rod_diameter_m: 0.0,
/// });
/// assert_eq!(result.resistance, result.r1);
/// assert_eq!(result.r2, 0.0);
/// ```
pub fn schwarz_resistance(params: &SchwarzParams) -> SchwarzResult {
    let rho = params.resistivity;
    let area = params.area_m2;
    let lc = params.conductor_length_m;
    let h = params.depth_m;
    let diameter = params.conductor_diameter_m;
    let ratio = params.length_width_ratio;

    if rho <= 0.0 || area <= 0.0 || lc <= 0.0 || h <= 0.0 || diameter <= 0.0 || !(ratio > 0.0) {
        return SchwarzResult::default();
    }
    let ratio = if ratio < 1.0 { 1.0 / ratio } else { ratio };

    let sqrt_area = area.sqrt();
    let SchwarzCoefficients { k1, k2 } = schwarz_coefficients(h / sqrt_area, ratio);

    let a_prime = (diameter / 2.0 * 2.0 * h).sqrt();
    let r1 = rho / (PI * lc) * ((2.0 * lc / a_prime).ln() + k1 * lc / sqrt_area - k2);

    let nr = params.rod_count;
    let lr = params.rod_length_m;
    let b = params.rod_diameter_m / 2.0;
    if nr == 0 || lr <= 0.0 || b <= 0.0 {
        return SchwarzResult {
            resistance: r1,
            k1,
            k2,
            r1,
            r2: 0.0,
            r12: 0.0,
        };
    }

    let nr_f = nr as f64;
    let r2 = rho / (2.0 * PI * nr_f * lr)
        * ((4.0 * lr / b).ln() - 1.0 + (2.0 * k1 * lr / sqrt_area) * (nr_f.sqrt() - 1.0).powi(2));
    let r12 = rho / (PI * lc) * ((2.0 * lc / lr).ln() + k1 * lc / sqrt_area - k2 + 1.0);

    let denominator = r1 + r2 - 2.0 * r12;
    let resistance = if denominator == 0.0 {
        r1
    } else {
        (r1 * r2 - r12 * r12) / denominator
    };

    SchwarzResult {
        resistance,
        k1,
        k2,
        r1,
        r2,
        r12,
    }
}
