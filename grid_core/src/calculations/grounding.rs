//! # Grounding Grid Safety Calculation
//!
//! Runs the whole grounding design as a chain of pure stages over one
//! [`GroundingDesign`]:
//!
//! 1. Apparent soil resistivity (two-layer image series or uniform)
//! 2. Grid resistance by the selected method
//! 3. Grid current and ground potential rise
//! 4. Geometric factors Ki, Km, Ks and the mesh touch/step voltages
//! 5. Surface derating and the permissible touch/step voltages
//! 6. Thermal minimum conductor section
//!
//! Each stage reads only the part of the design it needs and returns a plain
//! result record; [`calculate`] stitches them into a [`GroundingReport`].
//!
//! ## Assumptions
//!
//! - Mesh voltages use the total buried length Lt = Lc + LR
//! - Mesh spacing D is the mean of the spacings along x and y
//! - Surface derating uses the upper-layer resistivity ρ1; without a surface
//!   layer the surface resistivity is ρ1 and Cs = 1
//! - The conductor carries the full fault current (no division)
//!
//! ## Example
//!
//! ```rust
//! use grid_core::calculations::grounding::calculate;
//! use grid_core::design::GroundingDesign;
//!
//! let design = GroundingDesign::example();
//! let report = calculate(&design).unwrap();
//!
//! println!("Rg = {:.3} Ω", report.resistance.resistance_ohm);
//! println!("Em = {:.0} V (limit {:.0} V)", report.mesh_touch_v, report.limits.permissible.touch_v);
//! println!("Pass: {}", report.passes());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::design::{GroundingDesign, ResistanceMethod, SoilModelKind};
use crate::equations::conductor::{minimum_conductor_section, thermal_coefficient_kf};
use crate::equations::geometry::{
    irregularity_factor, mesh_step_voltage, mesh_touch_voltage, step_geometry_factor, touch_geometry_factor,
};
use crate::equations::permissible::{
    derating_factor, permissible_voltages, presumed_touch_voltage, tolerable_body_current, BodyCurrent,
    PermissibleVoltages,
};
use crate::equations::registry::{Equation, EquationTracker};
use crate::equations::resistance::{
    laurent_niemann_resistance, schwarz_resistance, sverak_resistance, SchwarzParams, SchwarzResult,
};
use crate::equations::soil::{equivalent_radius, reflection_coefficient, SeriesConfig};
use crate::errors::CalcResult;
use crate::materials::{lookup_connection, lookup_material, max_design_temperature, next_standard_section};

// ============================================================================
// Stage results
// ============================================================================

/// Soil stage output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilResult {
    /// Equivalent radius of the grid area r (m)
    pub equivalent_radius_m: f64,
    /// Reflection coefficient k (two-layer only)
    pub reflection_coefficient: Option<f64>,
    /// Apparent resistivity ρa (Ω·m)
    pub apparent_resistivity: f64,
}

/// Resistance stage output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceResult {
    pub method: ResistanceMethod,
    /// Grid resistance Rg (Ω)
    pub resistance_ohm: f64,
    /// Buried length used by methods A and B: Lc + LR (m)
    pub total_buried_length_m: f64,
    /// Detailed terms, Schwarz method only
    pub schwarz: Option<SchwarzResult>,
}

/// Geometric factor stage output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryResult {
    /// Effective number of parallel conductors n
    pub n: f64,
    /// Mesh spacing D (m)
    pub mesh_spacing_m: f64,
    pub has_perimeter_rods: bool,
    pub ki: f64,
    pub km: f64,
    pub ks: f64,
}

/// Permissible voltage stage output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Surface layer derating factor Cs
    pub cs: f64,
    /// Resistivity at the surface ρs (Ω·m)
    pub surface_resistivity: f64,
    pub body_current: Option<BodyCurrent>,
    pub permissible: PermissibleVoltages,
    /// Presumed touch voltage from the duration curve (V)
    pub presumed_touch_v: Option<f64>,
}

/// Conductor sizing stage output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorCheck {
    pub material_id: String,
    pub connection_id: String,
    /// Design temperature Tm = min(joint limit, melting point) (°C)
    pub max_temp_c: f64,
    /// Material constant Kf
    pub kf: f64,
    /// Thermal minimum section (mm²)
    pub minimum_section_mm2: f64,
    /// Smallest standard section covering the minimum (mm²)
    pub recommended_section_mm2: Option<f64>,
    /// Installed section (mm²)
    pub selected_section_mm2: f64,
}

impl ConductorCheck {
    /// Minimum over selected section; above 1 the conductor is undersized.
    pub fn unity(&self) -> f64 {
        if self.selected_section_mm2 <= 0.0 {
            f64::INFINITY
        } else {
            self.minimum_section_mm2 / self.selected_section_mm2
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Everything computed for one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingReport {
    pub label: String,

    // === Soil and resistance ===
    pub soil: SoilResult,
    pub resistance: ResistanceResult,

    // === Fault ===
    /// Grid current Ig (A)
    pub grid_current_a: f64,
    /// Ground potential rise GPR = Ig·Rg (V)
    pub gpr_v: f64,

    // === Mesh voltages ===
    pub geometry: GeometryResult,
    /// Mesh (touch) voltage Em (V)
    pub mesh_touch_v: f64,
    /// Step voltage Es (V)
    pub mesh_step_v: f64,

    // === Limits ===
    pub limits: SafetyLimits,

    // === Conductor ===
    pub conductor: ConductorCheck,

    // === Verdicts ===
    /// Em ≤ Etouch
    pub touch_ok: bool,
    /// Es ≤ Estep
    pub step_ok: bool,
    /// GPR ≤ Etouch: no further touch analysis needed
    pub gpr_below_touch_limit: bool,
    /// Selected section ≥ thermal minimum
    pub conductor_ok: bool,

    /// Equations used, for the report appendix
    pub equations: EquationTracker,
}

impl GroundingReport {
    /// True when touch, step and conductor checks all pass
    pub fn passes(&self) -> bool {
        self.touch_ok && self.step_ok && self.conductor_ok
    }

    /// Em / Etouch
    pub fn touch_unity(&self) -> f64 {
        ratio(self.mesh_touch_v, self.limits.permissible.touch_v)
    }

    /// Es / Estep
    pub fn step_unity(&self) -> f64 {
        ratio(self.mesh_step_v, self.limits.permissible.step_v)
    }

    /// Get the governing (highest) unity ratio
    pub fn governing_unity(&self) -> f64 {
        self.touch_unity()
            .max(self.step_unity())
            .max(self.conductor.unity())
    }

    /// Get a description of what governs the design
    pub fn governing_condition(&self) -> &'static str {
        let (touch, step, conductor) = (self.touch_unity(), self.step_unity(), self.conductor.unity());
        if touch >= step && touch >= conductor {
            "Touch voltage"
        } else if step >= conductor {
            "Step voltage"
        } else {
            "Conductor section"
        }
    }
}

fn ratio(actual: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        if actual <= 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        actual / limit
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Stage 1: equivalent radius and apparent resistivity.
pub fn soil_stage(design: &GroundingDesign, series: &SeriesConfig) -> SoilResult {
    let r = equivalent_radius(design.grid.area());
    let reflection = match (design.soil.model, design.soil.rho2) {
        (SoilModelKind::TwoLayer, Some(rho2)) => Some(reflection_coefficient(design.soil.rho1, rho2)),
        _ => None,
    };
    let rho_a = design.soil.apparent_resistivity(r, series);
    debug!(equivalent_radius_m = r, apparent_resistivity = rho_a, "soil stage");

    SoilResult {
        equivalent_radius_m: r,
        reflection_coefficient: reflection,
        apparent_resistivity: rho_a,
    }
}

/// Stage 2: grid resistance with the design's method.
pub fn resistance_stage(design: &GroundingDesign, apparent_resistivity: f64) -> ResistanceResult {
    let grid = &design.grid;
    let method = design.resistance_method();
    let area = grid.area();
    let total_length = grid.total_conductor_length() + design.rods.total_length(grid);

    let (resistance, schwarz) = match method {
        ResistanceMethod::LaurentNiemann => (laurent_niemann_resistance(apparent_resistivity, area, total_length), None),
        ResistanceMethod::Sverak => (
            sverak_resistance(apparent_resistivity, area, total_length, grid.depth_m),
            None,
        ),
        ResistanceMethod::Schwarz => {
            let result = schwarz_resistance(&SchwarzParams {
                resistivity: apparent_resistivity,
                area_m2: area,
                length_width_ratio: grid.length_width_ratio(),
                conductor_length_m: grid.total_conductor_length(),
                depth_m: grid.depth_m,
                conductor_diameter_m: grid.conductor_diameter_m,
                rod_count: design.rods.valid_count(grid),
                rod_length_m: design.rods.length_m,
                rod_diameter_m: design.rods.diameter_m,
            });
            (result.resistance, Some(result))
        }
    };
    debug!(method = method.display_name(), resistance_ohm = resistance, "resistance stage");

    ResistanceResult {
        method,
        resistance_ohm: resistance,
        total_buried_length_m: total_length,
        schwarz,
    }
}

/// Current flowing from the grid into the soil: Ig = If·1000·Sf/100 (A).
pub fn grid_current_a(design: &GroundingDesign) -> f64 {
    design.fault.grid_current_a()
}

/// Stage 3: irregularity and geometric factors.
pub fn geometry_stage(design: &GroundingDesign) -> GeometryResult {
    let grid = &design.grid;
    let n = grid.effective_conductor_count();
    let spacing = grid.mesh_spacing();
    let has_perimeter_rods = design.rods.has_perimeter_rods(grid);

    GeometryResult {
        n,
        mesh_spacing_m: spacing,
        has_perimeter_rods,
        ki: irregularity_factor(n),
        km: touch_geometry_factor(spacing, grid.depth_m, grid.conductor_diameter_m, n, has_perimeter_rods),
        ks: step_geometry_factor(spacing, grid.depth_m, n),
    }
}

/// Stage 4: surface derating, permissible and presumed voltages.
pub fn limits_stage(design: &GroundingDesign) -> SafetyLimits {
    let rho = design.soil.rho1;
    let (rho_s, hs) = match design.surface_layer {
        Some(layer) => (layer.resistivity, layer.thickness_m),
        None => (rho, 0.0),
    };
    let cs = derating_factor(rho, rho_s, hs);
    let t = design.fault.duration_s;
    let permissible = permissible_voltages(t, cs, rho_s, design.body_weight);
    debug!(cs, touch_v = permissible.touch_v, step_v = permissible.step_v, "limits stage");

    SafetyLimits {
        cs,
        surface_resistivity: rho_s,
        body_current: tolerable_body_current(t, design.body_weight),
        permissible,
        presumed_touch_v: presumed_touch_voltage(t, design.installation_area),
    }
}

/// Stage 5: thermal sizing of the grid conductor.
pub fn conductor_stage(design: &GroundingDesign) -> CalcResult<ConductorCheck> {
    let selection = &design.conductor;
    let material = lookup_material(&selection.material_id)?;
    let connection = lookup_connection(&selection.connection_id)?;
    let tm = max_design_temperature(material, connection);
    let ta = selection.ambient_temp_c;

    let kf = thermal_coefficient_kf(material.alpha20, material.rho20, material.tcap, tm, ta);
    let minimum = minimum_conductor_section(
        design.fault.current_ka,
        design.fault.duration_s,
        material.alpha20,
        material.rho20,
        material.tcap,
        tm,
        ta,
    );
    debug!(kf, minimum_section_mm2 = minimum, "conductor stage");

    Ok(ConductorCheck {
        material_id: material.id.clone(),
        connection_id: connection.id.clone(),
        max_temp_c: tm,
        kf,
        minimum_section_mm2: minimum,
        recommended_section_mm2: next_standard_section(minimum),
        selected_section_mm2: selection.section_mm2,
    })
}

// ============================================================================
// Pipeline
// ============================================================================

/// Calculate a grounding design with the default series configuration.
///
/// # Errors
///
/// - `InvalidInput` / `MissingField` when the design fails validation
/// - `MaterialNotFound` / `ConnectionNotFound` for unknown catalog ids
pub fn calculate(design: &GroundingDesign) -> CalcResult<GroundingReport> {
    calculate_with(design, &SeriesConfig::default())
}

/// Calculate a grounding design with an explicit series configuration.
pub fn calculate_with(design: &GroundingDesign, series: &SeriesConfig) -> CalcResult<GroundingReport> {
    design.validate()?;
    let mut eq = EquationTracker::new();

    let soil = soil_stage(design, series);
    eq.record(Equation::EquivalentRadius, "Grid equivalent radius");
    if soil.reflection_coefficient.is_some() {
        eq.record(Equation::ReflectionCoefficient, "Two-layer soil");
        eq.record(Equation::ApparentResistivity, "Two-layer soil");
    }

    let resistance = resistance_stage(design, soil.apparent_resistivity);
    match resistance.method {
        ResistanceMethod::LaurentNiemann => eq.record(Equation::LaurentNiemannResistance, "Grid resistance"),
        ResistanceMethod::Sverak => eq.record(Equation::SverakResistance, "Grid resistance"),
        ResistanceMethod::Schwarz => {
            eq.record(Equation::SchwarzGridResistance, "Grid resistance");
            if resistance.schwarz.is_some_and(|s| s.r2 > 0.0) {
                eq.record(Equation::SchwarzRodResistance, "Rod resistance");
                eq.record(Equation::SchwarzMutualResistance, "Grid-rod mutual resistance");
                eq.record(Equation::SchwarzCombinedResistance, "Grid resistance");
            }
        }
    }

    let ig = grid_current_a(design);
    let gpr = ig * resistance.resistance_ohm;
    eq.record(Equation::GridCurrent, "Current division");
    eq.record(Equation::GroundPotentialRise, "GPR");

    let geometry = geometry_stage(design);
    eq.record(Equation::IrregularityFactor, "Mesh and step voltage");
    eq.record(Equation::TouchGeometryFactor, "Mesh voltage");
    eq.record(Equation::StepGeometryFactor, "Step voltage");

    let rho_a = soil.apparent_resistivity;
    let lt = resistance.total_buried_length_m;
    let em = mesh_touch_voltage(rho_a, ig, geometry.km, geometry.ki, lt);
    let es = mesh_step_voltage(rho_a, ig, geometry.ks, geometry.ki, lt);
    eq.record(Equation::MeshTouchVoltage, "Mesh voltage");
    eq.record(Equation::MeshStepVoltage, "Step voltage");
    debug!(gpr_v = gpr, mesh_touch_v = em, mesh_step_v = es, "grid voltages");

    let limits = limits_stage(design);
    eq.record(Equation::DeratingFactor, "Surface layer");
    eq.record(Equation::TolerableBodyCurrent, "Body current");
    eq.record(Equation::PermissibleTouchVoltage, "Touch limit");
    eq.record(Equation::PermissibleStepVoltage, "Step limit");
    if limits.presumed_touch_v.is_some() {
        eq.record(Equation::PresumedTouchVoltage, "Presumed touch voltage");
    }

    let conductor = conductor_stage(design)?;
    eq.record(Equation::ThermalCoefficientKf, "Conductor sizing");
    eq.record(Equation::MinimumConductorSection, "Conductor sizing");

    let touch_limit = limits.permissible.touch_v;
    let conductor_ok =
        conductor.minimum_section_mm2 > 0.0 && conductor.selected_section_mm2 >= conductor.minimum_section_mm2;

    Ok(GroundingReport {
        label: design.label.clone(),
        soil,
        resistance,
        grid_current_a: ig,
        gpr_v: gpr,
        geometry,
        mesh_touch_v: em,
        mesh_step_v: es,
        touch_ok: em <= touch_limit,
        step_ok: es <= limits.permissible.step_v,
        gpr_below_touch_limit: gpr <= touch_limit,
        conductor_ok,
        limits,
        conductor,
        equations: eq,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{RodPosition, SoilProfile, SurfaceLayer};
    use crate::equations::permissible::{BodyWeight, DurationClass};
    use approx::assert_relative_eq;

    fn corner_rods(design: &mut GroundingDesign) {
        design.rods.positions = vec![
            RodPosition { i: 0, j: 0 },
            RodPosition { i: 10, j: 0 },
            RodPosition { i: 0, j: 8 },
            RodPosition { i: 10, j: 8 },
        ];
        design.rods.length_m = 3.0;
        design.rods.diameter_m = 0.016;
    }

    #[test]
    fn test_example_resistance_sverak() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        assert_eq!(report.resistance.method, ResistanceMethod::Sverak);
        assert_eq!(report.resistance.total_buried_length_m, 890.0);
        assert_relative_eq!(report.resistance.resistance_ohm, 1.0885500, max_relative = 1e-6);
        assert!(report.resistance.schwarz.is_none());
    }

    #[test]
    fn test_example_laurent_niemann() {
        let mut design = GroundingDesign::example();
        design.method = Some(ResistanceMethod::LaurentNiemann);
        let report = calculate(&design).unwrap();
        assert_relative_eq!(report.resistance.resistance_ohm, 1.1031914, max_relative = 1e-6);
    }

    #[test]
    fn test_example_schwarz_no_rods_equals_r1() {
        let mut design = GroundingDesign::example();
        design.method = Some(ResistanceMethod::Schwarz);
        let report = calculate(&design).unwrap();
        let schwarz = report.resistance.schwarz.unwrap();
        assert_eq!(report.resistance.resistance_ohm, schwarz.r1);
        assert_eq!(schwarz.r2, 0.0);
        assert_eq!(schwarz.r12, 0.0);
        assert_relative_eq!(schwarz.r1, 1.1168705, max_relative = 1e-5);
    }

    #[test]
    fn test_example_schwarz_with_rods() {
        let mut design = GroundingDesign::example();
        design.method = Some(ResistanceMethod::Schwarz);
        corner_rods(&mut design);
        let report = calculate(&design).unwrap();
        let schwarz = report.resistance.schwarz.unwrap();
        assert_relative_eq!(schwarz.r2, 8.6107414, max_relative = 1e-5);
        assert_relative_eq!(schwarz.r12, 1.0145583, max_relative = 1e-5);
        assert_relative_eq!(report.resistance.resistance_ohm, 1.1155108, max_relative = 1e-5);
        assert!(report.geometry.has_perimeter_rods);
        assert!(report
            .equations
            .unique_equations()
            .contains(&Equation::SchwarzCombinedResistance));
    }

    #[test]
    fn test_rods_extend_buried_length() {
        let mut design = GroundingDesign::example();
        corner_rods(&mut design);
        let report = calculate(&design).unwrap();
        assert_eq!(report.resistance.total_buried_length_m, 902.0);
    }

    #[test]
    fn test_example_voltages() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        assert!((report.grid_current_a - 6000.0).abs() < 1e-9);
        assert_relative_eq!(report.gpr_v, 6531.3002, max_relative = 1e-6);

        assert_relative_eq!(report.geometry.ki, 2.356889, max_relative = 1e-6);
        assert_relative_eq!(report.geometry.km, 0.843502, max_relative = 1e-5);
        assert_relative_eq!(report.geometry.ks, 0.439578, max_relative = 1e-5);
        assert_relative_eq!(report.mesh_touch_v, 1340.252, max_relative = 1e-5);
        assert_relative_eq!(report.mesh_step_v, 698.4513, max_relative = 1e-5);
    }

    #[test]
    fn test_example_limits() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        assert!((report.limits.cs - 0.7).abs() < 1e-12);
        assert_relative_eq!(report.limits.permissible.touch_v, 680.8024, max_relative = 1e-6);
        assert_relative_eq!(report.limits.permissible.step_v, 2231.0633, max_relative = 1e-6);
        assert_eq!(report.limits.permissible.duration, DurationClass::Short);
        assert_relative_eq!(report.limits.presumed_touch_v.unwrap(), 350.6749, max_relative = 1e-6);
    }

    #[test]
    fn test_example_conductor() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        let c = &report.conductor;
        assert_eq!(c.max_temp_c, 850.0);
        assert_relative_eq!(c.kf, 3.792678, max_relative = 1e-6);
        assert_relative_eq!(c.minimum_section_mm2, 26.818285, max_relative = 1e-6);
        assert_eq!(c.recommended_section_mm2, Some(35.0));
        assert!(report.conductor_ok);
    }

    #[test]
    fn test_example_verdicts() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        assert!(!report.touch_ok);
        assert!(report.step_ok);
        assert!(!report.gpr_below_touch_limit);
        assert!(!report.passes());
        assert_eq!(report.governing_condition(), "Touch voltage");
        assert!((report.governing_unity() - report.touch_unity()).abs() < 1e-12);
    }

    #[test]
    fn test_small_fault_passes() {
        let mut design = GroundingDesign::example();
        design.fault.current_ka = 2.0;
        design.fault.division_pct = 20.0;
        design.body_weight = BodyWeight::Kg70;
        let report = calculate(&design).unwrap();
        assert!(report.touch_ok);
        assert!(report.step_ok);
        assert!(report.conductor_ok);
        assert!(report.passes());
        assert!(report.governing_unity() <= 1.0);
    }

    #[test]
    fn test_no_surface_layer_no_derating() {
        let mut design = GroundingDesign::example();
        design.surface_layer = None;
        let limits = limits_stage(&design);
        assert_eq!(limits.cs, 1.0);
        assert_eq!(limits.surface_resistivity, 100.0);
    }

    #[test]
    fn test_thin_surface_layer_no_derating() {
        let mut design = GroundingDesign::example();
        design.surface_layer = Some(SurfaceLayer {
            resistivity: 3000.0,
            thickness_m: 0.0,
        });
        assert_eq!(limits_stage(&design).cs, 1.0);
    }

    #[test]
    fn test_two_layer_soil_stage() {
        let mut design = GroundingDesign::example();
        design.soil = SoilProfile::two_layer(100.0, 200.0, 2.0);
        let soil = soil_stage(&design, &SeriesConfig::default());
        assert!((soil.reflection_coefficient.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_relative_eq!(soil.apparent_resistivity, 196.734, max_relative = 1e-5);

        let report = calculate(&design).unwrap();
        assert!(report
            .equations
            .unique_equations()
            .contains(&Equation::ApparentResistivity));
    }

    #[test]
    fn test_unknown_material() {
        let mut design = GroundingDesign::example();
        design.conductor.material_id = "brass".to_string();
        let err = calculate(&design).unwrap_err();
        assert_eq!(err.error_code(), "MATERIAL_NOT_FOUND");
    }

    #[test]
    fn test_invalid_design_rejected() {
        let mut design = GroundingDesign::example();
        design.grid.depth_m = 0.0;
        assert_eq!(calculate(&design).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_undersized_conductor() {
        let mut design = GroundingDesign::example();
        design.conductor.section_mm2 = 16.0;
        let report = calculate(&design).unwrap();
        assert!(!report.conductor_ok);
        assert!(report.conductor.unity() > 1.0);
    }

    #[test]
    fn test_report_serializes() {
        let report = calculate(&GroundingDesign::example()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"method\":\"sverak\""));
        let back: GroundingReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, report.label);
        assert_eq!(back.touch_ok, report.touch_ok);
        assert_eq!(back.equations.usages().len(), report.equations.usages().len());
    }
}
