//! # Conductor Thermal Sizing
//!
//! Minimum cross-section of a grid conductor that survives the fault current
//! for the fault duration without exceeding its maximum allowable
//! temperature (Onderdonk-type equation).
//!
//! ## Notation
//!
//! - `If` = Fault current (kA)
//! - `t` = Fault duration (s)
//! - `α20` = Thermal coefficient of resistivity at 20 °C (1/°C)
//! - `ρ20` = Resistivity at 20 °C (μΩ·cm)
//! - `TCAP` = Thermal capacity per unit volume (J/(cm³·°C))
//! - `Tm` = Maximum allowable temperature (°C)
//! - `Ta` = Ambient temperature (°C)
//!
//! ## Formula
//!
//! ```text
//! Ko = 1/α20 − 20
//! Kf = √[(α20·ρ20·10⁴) / (TCAP·ln((Ko + Tm)/(Ko + Ta)))]
//! A  = If·Kf·√t        (mm²)
//! ```
//!
//! With If in kA the section comes out in mm².

/// Material constant Kf of the sizing equation.
///
/// Returns 0 when Tm ≤ Ta, when α20, ρ20 or TCAP is not positive, or when the
/// logarithm argument is not positive.
///
/// # Example
/// ```rust
/// use grid_core::equations::conductor::thermal_coefficient_kf;
///
/// // Annealed soft-drawn copper, 1083 °C melting point, 40 °C ambient
/// let kf = thermal_coefficient_kf(0.00393, 1.72, 3.42, 1083.0, 40.0);
/// assert!((kf - 3.5496).abs() < 1e-3);
/// ```
pub fn thermal_coefficient_kf(alpha20: f64, rho20: f64, tcap: f64, tm: f64, ta: f64) -> f64 {
    if alpha20 <= 0.0 || rho20 <= 0.0 || tcap <= 0.0 || tm <= ta {
        return 0.0;
    }

    let ko = 1.0 / alpha20 - 20.0;
    let lower = ko + ta;
    if lower <= 0.0 {
        return 0.0;
    }
    let log_term = ((ko + tm) / lower).ln();
    if log_term <= 0.0 || !log_term.is_finite() {
        return 0.0;
    }

    (alpha20 * rho20 * 1e4 / (tcap * log_term)).sqrt()
}

/// Minimum conductor cross-section (mm²).
///
/// # Formula
/// A = If·Kf·√t, Kf from [`thermal_coefficient_kf`]
///
/// Choosing Tm (the lower of the connection limit and the material melting
/// point) is left to the caller. Returns 0 for a non-positive current or
/// duration, or whenever Kf is 0.
///
/// # Example
/// ```rust
/// use grid_core::equations::conductor::{minimum_conductor_section, thermal_coefficient_kf};
///
/// let a = minimum_conductor_section(10.0, 0.5, 0.00393, 1.72, 3.42, 1083.0, 40.0);
/// let kf = thermal_coefficient_kf(0.00393, 1.72, 3.42, 1083.0, 40.0);
/// assert_eq!(a, 10.0 * kf * 0.5f64.sqrt());
/// ```
pub fn minimum_conductor_section(
    current_ka: f64,
    duration_s: f64,
    alpha20: f64,
    rho20: f64,
    tcap: f64,
    tm: f64,
    ta: f64,
) -> f64 {
    if current_ka <= 0.0 || duration_s <= 0.0 {
        return 0.0;
    }
    let kf = thermal_coefficient_kf(alpha20, rho20, tcap, tm, ta);
    current_ka * kf * duration_s.sqrt()
}
