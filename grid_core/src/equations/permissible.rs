//! # Permissible Body Voltages
//!
//! Tolerable body current and the touch/step voltage limits derived from it,
//! including surface-layer derating and the presumed touch-voltage curves.
//!
//! ## Notation
//!
//! - `t` = Fault duration (s)
//! - `Ib` = Tolerable body current (A)
//! - `k` = Body constant: 0.116 (50 kg) or 0.157 (70 kg)
//! - `Cs` = Surface-layer derating factor
//! - `ρs` = Surface-layer resistivity (Ω·m)
//! - `hs` = Surface-layer thickness (m)
//!
//! ## Duration classes
//!
//! Faults up to 3 s use the `k/√t` body-current model ("short"). Longer
//! faults use a fixed 6 mA let-go current ("long").

use serde::{Deserialize, Serialize};

use super::interpolate::{interpolate, log_lerp, Axis, Knot};

/// Upper bound (inclusive) of the short-duration model (s)
pub const SHORT_DURATION_LIMIT_S: f64 = 3.0;

/// Fixed body current for long faults (A)
pub const LONG_DURATION_BODY_CURRENT_A: f64 = 0.006;

/// Body resistance assumed by the voltage limits (Ω)
pub const BODY_RESISTANCE_OHM: f64 = 1000.0;

/// Assumed body mass for the tolerable current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyWeight {
    /// 50 kg person: k = 0.116
    #[serde(rename = "50kg")]
    #[default]
    Kg50,
    /// 70 kg person: k = 0.157
    #[serde(rename = "70kg")]
    Kg70,
}

impl BodyWeight {
    /// All variants for UI selection
    pub const ALL: [BodyWeight; 2] = [BodyWeight::Kg50, BodyWeight::Kg70];

    /// Body constant k (A·√s)
    pub fn k(&self) -> f64 {
        match self {
            BodyWeight::Kg50 => 0.116,
            BodyWeight::Kg70 => 0.157,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BodyWeight::Kg50 => "50 kg",
            BodyWeight::Kg70 => "70 kg",
        }
    }
}

/// Which body-current model applies for a fault duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
    /// t ≤ 3 s
    Short,
    /// t > 3 s
    Long,
}

impl DurationClass {
    /// Classify a fault duration. Non-positive durations count as short.
    pub fn for_duration(duration_s: f64) -> Self {
        if duration_s > SHORT_DURATION_LIMIT_S {
            DurationClass::Long
        } else {
            DurationClass::Short
        }
    }
}

/// Tolerable body current and the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyCurrent {
    /// Tolerable current Ib (A)
    pub current_a: f64,
    pub duration: DurationClass,
}

/// Permissible touch and step voltages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermissibleVoltages {
    /// Maximum tolerable touch voltage (V)
    pub touch_v: f64,
    /// Maximum tolerable step voltage (V)
    pub step_v: f64,
    pub duration: DurationClass,
}

/// Tolerable body current Ib.
///
/// # Formula
/// - t ≤ 3 s: Ib = k/√t
/// - t > 3 s: Ib = 0.006 A
///
/// Returns `None` if `t` is non-finite or not positive.
///
/// # Example
/// ```rust
/// use grid_core::equations::permissible::{tolerable_body_current, BodyWeight, DurationClass};
///
/// let ib = tolerable_body_current(0.5, BodyWeight::Kg50).unwrap();
/// assert!((ib.current_a - 0.16405).abs() < 1e-5);
/// assert_eq!(ib.duration, DurationClass::Short);
/// ```
pub fn tolerable_body_current(duration_s: f64, body_weight: BodyWeight) -> Option<BodyCurrent> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return None;
    }
    let current = match DurationClass::for_duration(duration_s) {
        DurationClass::Short => BodyCurrent {
            current_a: body_weight.k() / duration_s.sqrt(),
            duration: DurationClass::Short,
        },
        DurationClass::Long => BodyCurrent {
            current_a: LONG_DURATION_BODY_CURRENT_A,
            duration: DurationClass::Long,
        },
    };
    Some(current)
}

/// Surface-layer derating factor Cs.
///
/// # Formula
/// Cs = 1 − 0.09·(1 − ρ/ρs) / (2hs + 0.09)
///
/// Cs = 1 when there is no distinct surface layer: hs ≤ 0, ρs ≤ 0, or
/// |ρ − ρs| < 0.001.
pub fn derating_factor(rho: f64, rho_s: f64, hs: f64) -> f64 {
    if hs <= 0.0 || rho_s <= 0.0 || (rho - rho_s).abs() < 0.001 {
        return 1.0;
    }
    1.0 - 0.09 * (1.0 - rho / rho_s) / (2.0 * hs + 0.09)
}

/// Maximum touch voltage with the short-duration body model.
///
/// # Formula
/// Etouch = (1000 + 1.5·Cs·ρs)·k/√t
///
/// Returns 0 if t ≤ 0.
pub fn max_touch_voltage(duration_s: f64, cs: f64, rho_s: f64, body_weight: BodyWeight) -> f64 {
    if !(duration_s > 0.0) {
        return 0.0;
    }
    touch_base_resistance(cs, rho_s) * body_weight.k() / duration_s.sqrt()
}

/// Maximum step voltage with the short-duration body model.
///
/// # Formula
/// Estep = (1000 + 6·Cs·ρs)·k/√t
///
/// Returns 0 if t ≤ 0.
pub fn max_step_voltage(duration_s: f64, cs: f64, rho_s: f64, body_weight: BodyWeight) -> f64 {
    if !(duration_s > 0.0) {
        return 0.0;
    }
    step_base_resistance(cs, rho_s) * body_weight.k() / duration_s.sqrt()
}

#[inline]
fn touch_base_resistance(cs: f64, rho_s: f64) -> f64 {
    BODY_RESISTANCE_OHM + 1.5 * cs * rho_s
}

#[inline]
fn step_base_resistance(cs: f64, rho_s: f64) -> f64 {
    BODY_RESISTANCE_OHM + 6.0 * cs * rho_s
}

/// Permissible touch and step voltages for any fault duration.
///
/// - t ≤ 3 s: [`max_touch_voltage`] / [`max_step_voltage`], class `Short`
/// - t > 3 s: 0.006 A × base resistance, class `Long`
/// - t ≤ 0 (or non-finite): zeros, class `Short`
///
/// # Example
/// ```rust
/// use grid_core::equations::permissible::{permissible_voltages, BodyWeight, DurationClass};
///
/// let at_limit = permissible_voltages(3.0, 1.0, 100.0, BodyWeight::Kg50);
/// let beyond = permissible_voltages(3.5, 1.0, 100.0, BodyWeight::Kg50);
/// assert_eq!(at_limit.duration, DurationClass::Short);
/// assert_eq!(beyond.duration, DurationClass::Long);
/// ```
pub fn permissible_voltages(duration_s: f64, cs: f64, rho_s: f64, body_weight: BodyWeight) -> PermissibleVoltages {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return PermissibleVoltages {
            touch_v: 0.0,
            step_v: 0.0,
            duration: DurationClass::Short,
        };
    }

    match DurationClass::for_duration(duration_s) {
        DurationClass::Short => PermissibleVoltages {
            touch_v: max_touch_voltage(duration_s, cs, rho_s, body_weight),
            step_v: max_step_voltage(duration_s, cs, rho_s, body_weight),
            duration: DurationClass::Short,
        },
        DurationClass::Long => PermissibleVoltages {
            touch_v: LONG_DURATION_BODY_CURRENT_A * touch_base_resistance(cs, rho_s),
            step_v: LONG_DURATION_BODY_CURRENT_A * step_base_resistance(cs, rho_s),
            duration: DurationClass::Long,
        },
    }
}

// =============================================================================
// PRESUMED TOUCH VOLTAGE CURVES
// =============================================================================

/// Installation area selecting the presumed touch-voltage curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallationArea {
    /// Inside the fenced installation
    #[default]
    Internal,
    /// Outside the installation (public access)
    External,
}

impl InstallationArea {
    pub fn display_name(&self) -> &'static str {
        match self {
            InstallationArea::Internal => "Internal",
            InstallationArea::External => "External",
        }
    }

    /// Tabulated (t, V) reference points of the curve
    pub fn curve(&self) -> &'static [Knot<f64>; 7] {
        match self {
            InstallationArea::Internal => &INTERNAL_CURVE,
            InstallationArea::External => &EXTERNAL_CURVE,
        }
    }
}

/// Presumed touch voltage vs. duration, internal area.
pub const INTERNAL_CURVE: [Knot<f64>; 7] = [
    Knot::new("0.01 s", 0.01, 1000.0),
    Knot::new("0.03 s", 0.03, 900.0),
    Knot::new("0.1 s", 0.1, 700.0),
    Knot::new("0.3 s", 0.3, 450.0),
    Knot::new("1 s", 1.0, 250.0),
    Knot::new("3 s", 3.0, 160.0),
    Knot::new("10 s", 10.0, 120.0),
];

/// Presumed touch voltage vs. duration, external area.
pub const EXTERNAL_CURVE: [Knot<f64>; 7] = [
    Knot::new("0.01 s", 0.01, 700.0),
    Knot::new("0.03 s", 0.03, 600.0),
    Knot::new("0.1 s", 0.1, 450.0),
    Knot::new("0.3 s", 0.3, 300.0),
    Knot::new("1 s", 1.0, 170.0),
    Knot::new("3 s", 3.0, 110.0),
    Knot::new("10 s", 10.0, 85.0),
];

/// Shortest tabulated duration (s)
pub const CURVE_MIN_DURATION_S: f64 = 0.01;
/// Longest tabulated duration (s)
pub const CURVE_MAX_DURATION_S: f64 = 10.0;

/// Presumed touch voltage for a fault duration (V).
///
/// `t` is clamped to [0.01, 10] s; tabulated points are returned exactly and
/// values in between are interpolated linearly in log10(t) vs. log10(V).
///
/// Returns `None` if `t` is non-finite or not positive.
///
/// # Example
/// ```rust
/// use grid_core::equations::permissible::{presumed_touch_voltage, InstallationArea};
///
/// assert_eq!(presumed_touch_voltage(0.01, InstallationArea::Internal), Some(1000.0));
/// assert_eq!(presumed_touch_voltage(10.0, InstallationArea::Internal), Some(120.0));
/// ```
pub fn presumed_touch_voltage(duration_s: f64, area: InstallationArea) -> Option<f64> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return None;
    }
    let t = duration_s.clamp(CURVE_MIN_DURATION_S, CURVE_MAX_DURATION_S);
    interpolate(area.curve(), t, Axis::Log10, log_lerp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_current_short() {
        let ib = tolerable_body_current(0.5, BodyWeight::Kg70).unwrap();
        assert_relative_eq!(ib.current_a, 0.157 / 0.5f64.sqrt(), max_relative = 1e-12);
        assert_eq!(ib.duration, DurationClass::Short);
    }

    #[test]
    fn test_body_current_long() {
        let ib = tolerable_body_current(5.0, BodyWeight::Kg50).unwrap();
        assert_eq!(ib.current_a, 0.006);
        assert_eq!(ib.duration, DurationClass::Long);
    }

    #[test]
    fn test_body_current_invalid() {
        assert!(tolerable_body_current(0.0, BodyWeight::Kg50).is_none());
        assert!(tolerable_body_current(-1.0, BodyWeight::Kg50).is_none());
        assert!(tolerable_body_current(f64::INFINITY, BodyWeight::Kg50).is_none());
        assert!(tolerable_body_current(f64::NAN, BodyWeight::Kg70).is_none());
    }

    #[test]
    fn test_derating_factor() {
        // Gravel 3000 Ω·m, 0.1 m thick over 100 Ω·m soil
        let cs = derating_factor(100.0, 3000.0, 0.1);
        assert!((cs - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_derating_without_layer() {
        assert_eq!(derating_factor(100.0, 3000.0, 0.0), 1.0);
        assert_eq!(derating_factor(5.0, 9999.0, 0.0), 1.0);
        assert_eq!(derating_factor(100.0, 0.0, 0.1), 1.0);
        assert_eq!(derating_factor(100.0, 100.0005, 0.1), 1.0);
    }

    #[test]
    fn test_short_duration_limits() {
        let cs = 0.7;
        let touch = max_touch_voltage(0.5, cs, 3000.0, BodyWeight::Kg50);
        let step = max_step_voltage(0.5, cs, 3000.0, BodyWeight::Kg50);
        assert_relative_eq!(touch, 680.802409, max_relative = 1e-6);
        assert_relative_eq!(step, 2231.063316, max_relative = 1e-6);

        let touch70 = max_touch_voltage(0.5, cs, 3000.0, BodyWeight::Kg70);
        assert_relative_eq!(touch70, 921.430847, max_relative = 1e-6);

        assert_eq!(max_touch_voltage(0.0, cs, 3000.0, BodyWeight::Kg50), 0.0);
        assert_eq!(max_step_voltage(-1.0, cs, 3000.0, BodyWeight::Kg50), 0.0);
    }

    #[test]
    fn test_permissible_matches_short_formulas() {
        let v = permissible_voltages(1.0, 0.8, 2500.0, BodyWeight::Kg70);
        assert_eq!(v.touch_v, max_touch_voltage(1.0, 0.8, 2500.0, BodyWeight::Kg70));
        assert_eq!(v.step_v, max_step_voltage(1.0, 0.8, 2500.0, BodyWeight::Kg70));
        assert_eq!(v.duration, DurationClass::Short);
    }

    #[test]
    fn test_permissible_long_duration() {
        let v = permissible_voltages(5.0, 0.7, 3000.0, BodyWeight::Kg50);
        assert_relative_eq!(v.touch_v, 0.006 * (1000.0 + 1.5 * 0.7 * 3000.0), max_relative = 1e-12);
        assert_relative_eq!(v.step_v, 0.006 * (1000.0 + 6.0 * 0.7 * 3000.0), max_relative = 1e-12);
        assert_eq!(v.duration, DurationClass::Long);
    }

    #[test]
    fn test_duration_flips_exactly_at_three_seconds() {
        assert_eq!(permissible_voltages(3.0, 1.0, 100.0, BodyWeight::Kg50).duration, DurationClass::Short);
        let just_over = 3.0f64 + f64::EPSILON * 4.0;
        assert_eq!(permissible_voltages(just_over, 1.0, 100.0, BodyWeight::Kg50).duration, DurationClass::Long);
        assert_eq!(tolerable_body_current(3.0, BodyWeight::Kg50).unwrap().duration, DurationClass::Short);
        assert_eq!(tolerable_body_current(just_over, BodyWeight::Kg50).unwrap().duration, DurationClass::Long);
    }

    #[test]
    fn test_permissible_degenerate_duration() {
        let v = permissible_voltages(0.0, 1.0, 100.0, BodyWeight::Kg50);
        assert_eq!(v.touch_v, 0.0);
        assert_eq!(v.step_v, 0.0);
        assert_eq!(v.duration, DurationClass::Short);
    }

    #[test]
    fn test_presumed_curve_endpoints() {
        assert_eq!(presumed_touch_voltage(0.01, InstallationArea::Internal), Some(1000.0));
        assert_eq!(presumed_touch_voltage(10.0, InstallationArea::Internal), Some(120.0));
        // Clamped outside the table
        assert_eq!(presumed_touch_voltage(0.001, InstallationArea::Internal), Some(1000.0));
        assert_eq!(presumed_touch_voltage(60.0, InstallationArea::External), Some(85.0));
        // Interior knot
        assert_eq!(presumed_touch_voltage(1.0, InstallationArea::External), Some(170.0));
    }

    #[test]
    fn test_presumed_curve_log_log() {
        // Geometric midpoint between 1 s and 3 s in log space
        let t = 3.0f64.sqrt();
        let v = presumed_touch_voltage(t, InstallationArea::Internal).unwrap();
        assert_relative_eq!(v, (250.0f64 * 160.0).sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn test_presumed_curve_invalid() {
        assert_eq!(presumed_touch_voltage(0.0, InstallationArea::Internal), None);
        assert_eq!(presumed_touch_voltage(f64::NAN, InstallationArea::External), None);
    }

    #[test]
    fn test_internal_curve_above_external() {
        for t in [0.02, 0.2, 2.0, 7.0] {
            let internal = presumed_touch_voltage(t, InstallationArea::Internal).unwrap();
            let external = presumed_touch_voltage(t, InstallationArea::External).unwrap();
            assert!(internal > external);
        }
    }

    #[test]
    fn test_body_weight_serialization() {
        assert_eq!(serde_json::to_string(&BodyWeight::Kg70).unwrap(), "\"70kg\"");
        assert_eq!(serde_json::to_string(&DurationClass::Long).unwrap(), "\"long\"");
    }
}
