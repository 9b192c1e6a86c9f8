//! # Soil Resistivity Model
//!
//! Apparent resistivity seen by a grounding grid buried in one- or two-layer
//! soil, using the image-charge series.
//!
//! ## Notation
//!
//! - `ρ1` = Upper-layer resistivity (Ω·m)
//! - `ρ2` = Lower-layer resistivity (Ω·m)
//! - `h1` = Upper-layer thickness (m)
//! - `r` = Equivalent radius of the grid (m)
//! - `k` = Reflection coefficient between the layers
//! - `α` = r / h1
//!
//! ## Series
//!
//! ```text
//! N = 1 + 2 Σ_{n=1..∞} kⁿ / √(1 + (2n/α)²)
//! ρa = N · ρ1
//! ```
//!
//! The series converges slowly when |k| → 1 and α is small, so the
//! tolerance and the iteration cap are explicit configuration
//! ([`SeriesConfig`]).

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

/// Convergence control for the image-charge series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Stop once a term's magnitude falls below this value
    pub tolerance: f64,
    /// Hard cap on the number of terms
    pub max_iterations: u32,
}

impl SeriesConfig {
    /// Default term tolerance
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;
    /// Default iteration cap
    pub const DEFAULT_MAX_ITERATIONS: u32 = 10_000;
}

impl Default for SeriesConfig {
    fn default() -> Self {
        SeriesConfig {
            tolerance: Self::DEFAULT_TOLERANCE,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Radius of the circle with the same area as the grid.
///
/// # Formula
/// r = √(A/π)
///
/// Returns 0 for a non-positive area.
///
/// # Example
/// ```rust
/// use grid_core::equations::soil::equivalent_radius;
///
/// let r = equivalent_radius(std::f64::consts::PI * 25.0);
/// assert!((r - 5.0).abs() < 1e-12);
/// ```
#[inline]
pub fn equivalent_radius(area_m2: f64) -> f64 {
    if area_m2 <= 0.0 {
        return 0.0;
    }
    (area_m2 / PI).sqrt()
}

/// Reflection coefficient between two soil layers.
///
/// # Formula
/// k = (ρ2 − ρ1) / (ρ2 + ρ1)
///
/// Returns 0 if ρ1 + ρ2 = 0.
#[inline]
pub fn reflection_coefficient(rho1: f64, rho2: f64) -> f64 {
    let denominator = rho2 + rho1;
    if denominator == 0.0 {
        return 0.0;
    }
    (rho2 - rho1) / denominator
}

/// Image-series factor N with the default [`SeriesConfig`].
///
/// # Example
/// ```rust
/// use grid_core::equations::soil::image_series_factor;
///
/// // No contrast between layers: the series vanishes.
/// assert_eq!(image_series_factor(0.0, 2.5), 1.0);
/// ```
pub fn image_series_factor(k: f64, alpha: f64) -> f64 {
    image_series_factor_with(k, alpha, &SeriesConfig::default())
}

/// Image-series factor N with explicit convergence control.
///
/// Iterates n = 1, 2, ... accumulating `kⁿ / √(1 + (2n/α)²)` and stops when
/// the term magnitude drops below `config.tolerance` or after
/// `config.max_iterations` terms. Returns 1 when α = 0.
pub fn image_series_factor_with(k: f64, alpha: f64, config: &SeriesConfig) -> f64 {
    if alpha == 0.0 || !alpha.is_finite() || !k.is_finite() {
        return 1.0;
    }

    let mut sum = 0.0;
    let mut k_pow = 1.0;
    let mut converged = false;

    for n in 1..=config.max_iterations {
        k_pow *= k;
        let ratio = 2.0 * n as f64 / alpha;
        let term = k_pow / (1.0 + ratio * ratio).sqrt();
        sum += term;
        if term.abs() < config.tolerance {
            converged = true;
            break;
        }
    }

    if !converged && config.max_iterations > 0 {
        warn!(
            k,
            alpha,
            max_iterations = config.max_iterations,
            "image series stopped at iteration cap before reaching tolerance"
        );
    }

    1.0 + 2.0 * sum
}

/// Apparent resistivity of a (possibly) two-layer soil for a grid of
/// equivalent radius `r`.
///
/// Returns ρ1 unchanged for homogeneous soil: `rho2` absent, equal to `rho1`,
/// or a non-positive layer depth.
///
/// # Example
/// ```rust
/// use grid_core::equations::soil::apparent_resistivity;
///
/// assert_eq!(apparent_resistivity(100.0, Some(100.0), 2.0, 5.0), 100.0);
/// assert_eq!(apparent_resistivity(100.0, None, 2.0, 5.0), 100.0);
/// ```
pub fn apparent_resistivity(rho1: f64, rho2: Option<f64>, h1: f64, r: f64) -> f64 {
    apparent_resistivity_with(rho1, rho2, h1, r, &SeriesConfig::default())
}

/// [`apparent_resistivity`] with explicit series configuration.
pub fn apparent_resistivity_with(
    rho1: f64,
    rho2: Option<f64>,
    h1: f64,
    r: f64,
    config: &SeriesConfig,
) -> f64 {
    let rho2 = match rho2 {
        Some(rho2) if rho2 != rho1 && h1 > 0.0 => rho2,
        _ => return rho1,
    };

    let alpha = r / h1;
    let k = reflection_coefficient(rho1, rho2);
    image_series_factor_with(k, alpha, config) * rho1
}
