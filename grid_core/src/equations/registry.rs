//! # Equation Registry
//!
//! Central registry of the grounding-design equations used in calculations.
//! Each equation has metadata including its standard reference, plain-text
//! formula and variable definitions.
//!
//! ## Usage
//!
//! ```rust
//! use grid_core::equations::registry::{Equation, EquationTracker};
//!
//! let mut tracker = EquationTracker::new();
//! tracker.record(Equation::SverakResistance, "Grid resistance");
//!
//! let meta = Equation::SverakResistance.metadata();
//! assert!(meta.formula_plain.contains("20A"));
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// ============================================================================
// Code References
// ============================================================================

/// Reference to the standard or source behind an equation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CodeReference {
    /// IEEE Std 80, Guide for Safety in AC Substation Grounding
    Ieee80 { year: u16, clause: &'static str },
    /// Tabulated presumed touch-voltage curves
    PresumedTouchCurves,
    /// Discretized point-source superposition (visualization only)
    PointSourceApproximation,
}

impl CodeReference {
    /// Format the reference for display in reports
    pub fn citation(&self) -> String {
        match self {
            CodeReference::Ieee80 { year, clause } => format!("IEEE Std 80-{} Clause {}", year, clause),
            CodeReference::PresumedTouchCurves => "Presumed touch-voltage curves (tabulated)".to_string(),
            CodeReference::PointSourceApproximation => "Point-source superposition (approximate)".to_string(),
        }
    }

    /// Short form for inline references
    pub fn short_form(&self) -> &'static str {
        match self {
            CodeReference::Ieee80 { .. } => "IEEE 80",
            CodeReference::PresumedTouchCurves => "Curves",
            CodeReference::PointSourceApproximation => "Approx.",
        }
    }
}

// ============================================================================
// Equation Categories
// ============================================================================

/// Categories for grouping equations in the appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquationCategory {
    /// Soil resistivity modeling
    Soil,
    /// Grid resistance methods
    Resistance,
    /// Ki, Km, Ks
    GeometricFactors,
    /// Grid current, GPR, mesh and step voltages
    GridVoltages,
    /// Body current and permissible voltages
    PermissibleVoltages,
    /// Thermal conductor sizing
    ConductorSizing,
    /// Surface potential visualization
    PotentialField,
}

impl EquationCategory {
    /// All categories in appendix order
    pub const ALL: [EquationCategory; 7] = [
        EquationCategory::Soil,
        EquationCategory::Resistance,
        EquationCategory::GeometricFactors,
        EquationCategory::GridVoltages,
        EquationCategory::PermissibleVoltages,
        EquationCategory::ConductorSizing,
        EquationCategory::PotentialField,
    ];

    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            EquationCategory::Soil => "Soil Model",
            EquationCategory::Resistance => "Grid Resistance",
            EquationCategory::GeometricFactors => "Geometric Factors",
            EquationCategory::GridVoltages => "Grid Voltages",
            EquationCategory::PermissibleVoltages => "Permissible Voltages",
            EquationCategory::ConductorSizing => "Conductor Sizing",
            EquationCategory::PotentialField => "Potential Field",
        }
    }

    /// Sort order for the appendix (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            EquationCategory::Soil => 1,
            EquationCategory::Resistance => 2,
            EquationCategory::GeometricFactors => 3,
            EquationCategory::GridVoltages => 4,
            EquationCategory::PermissibleVoltages => 5,
            EquationCategory::ConductorSizing => 6,
            EquationCategory::PotentialField => 7,
        }
    }
}

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in an equation.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Symbol (e.g., "ρ", "Lt")
    pub symbol: &'static str,
    pub description: &'static str,
    /// Units (e.g., "Ω·m", "m")
    pub units: &'static str,
}

impl Variable {
    pub const fn new(symbol: &'static str, description: &'static str, units: &'static str) -> Self {
        Self { symbol, description, units }
    }
}

// ============================================================================
// Equation Metadata
// ============================================================================

/// Complete metadata for a grounding-design equation.
#[derive(Debug, Clone)]
pub struct EquationMetadata {
    /// Human-readable name
    pub name: &'static str,
    /// Brief description of what this equation calculates
    pub description: &'static str,
    /// The formula in plain text
    pub formula_plain: &'static str,
    /// Standard reference
    pub reference: CodeReference,
    pub variables: Vec<Variable>,
    pub category: EquationCategory,
    /// Source module where the equation implementation lives
    pub source_module: &'static str,
    /// Function implementing the equation
    pub source_function: &'static str,
}

// ============================================================================
// Equation Enum
// ============================================================================

/// All equations used by the grounding-design calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Equation {
    // Soil
    EquivalentRadius,
    ReflectionCoefficient,
    ApparentResistivity,
    // Resistance
    LaurentNiemannResistance,
    SverakResistance,
    SchwarzGridResistance,
    SchwarzRodResistance,
    SchwarzMutualResistance,
    SchwarzCombinedResistance,
    // Geometric factors
    IrregularityFactor,
    TouchGeometryFactor,
    StepGeometryFactor,
    // Grid voltages
    GridCurrent,
    GroundPotentialRise,
    MeshTouchVoltage,
    MeshStepVoltage,
    // Permissible voltages
    TolerableBodyCurrent,
    DeratingFactor,
    PermissibleTouchVoltage,
    PermissibleStepVoltage,
    PresumedTouchVoltage,
    // Conductor sizing
    ThermalCoefficientKf,
    MinimumConductorSection,
    // Potential field
    PointSourcePotential,
}

const IEEE80_YEAR: u16 = 2013;

impl Equation {
    /// Get the full metadata for this equation
    pub fn metadata(&self) -> EquationMetadata {
        use EquationCategory as Cat;
        let ieee = |clause: &'static str| CodeReference::Ieee80 {
            year: IEEE80_YEAR,
            clause,
        };

        match self {
            Equation::EquivalentRadius => EquationMetadata {
                name: "Equivalent Grid Radius",
                description: "Radius of the circle with the same area as the grid",
                formula_plain: "r = sqrt(A/pi)",
                reference: ieee("14.2"),
                variables: vec![
                    Variable::new("r", "Equivalent radius", "m"),
                    Variable::new("A", "Grid area", "m²"),
                ],
                category: Cat::Soil,
                source_module: "equations/soil.rs",
                source_function: "equivalent_radius",
            },
            Equation::ReflectionCoefficient => EquationMetadata {
                name: "Reflection Coefficient",
                description: "Resistivity contrast between the upper and lower soil layers",
                formula_plain: "k = (rho2 - rho1)/(rho2 + rho1)",
                reference: ieee("13.4.2"),
                variables: vec![
                    Variable::new("k", "Reflection coefficient", "-"),
                    Variable::new("rho1", "Upper-layer resistivity", "Ω·m"),
                    Variable::new("rho2", "Lower-layer resistivity", "Ω·m"),
                ],
                category: Cat::Soil,
                source_module: "equations/soil.rs",
                source_function: "reflection_coefficient",
            },
            Equation::ApparentResistivity => EquationMetadata {
                name: "Apparent Resistivity (Image Series)",
                description: "Two-layer apparent resistivity from the image-charge series",
                formula_plain: "rho_a = rho1 * [1 + 2 * sum(k^n / sqrt(1 + (2n/alpha)^2))], alpha = r/h1",
                reference: ieee("13.4.2"),
                variables: vec![
                    Variable::new("rho_a", "Apparent resistivity", "Ω·m"),
                    Variable::new("h1", "Upper-layer thickness", "m"),
                    Variable::new("alpha", "r/h1", "-"),
                ],
                category: Cat::Soil,
                source_module: "equations/soil.rs",
                source_function: "apparent_resistivity",
            },
            Equation::LaurentNiemannResistance => EquationMetadata {
                name: "Grid Resistance (Laurent-Niemann)",
                description: "Simplified grid resistance for shallow grids",
                formula_plain: "R = rho/(4r) + rho/Lt",
                reference: ieee("14.2"),
                variables: vec![
                    Variable::new("R", "Grid resistance", "Ω"),
                    Variable::new("Lt", "Total buried length", "m"),
                ],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "laurent_niemann_resistance",
            },
            Equation::SverakResistance => EquationMetadata {
                name: "Grid Resistance (Sverak)",
                description: "Grid resistance with burial-depth correction",
                formula_plain: "R = rho * [1/Lt + 1/sqrt(20A) * (1 + 1/(1 + h*sqrt(20/A)))]",
                reference: ieee("14.2"),
                variables: vec![
                    Variable::new("R", "Grid resistance", "Ω"),
                    Variable::new("h", "Burial depth", "m"),
                    Variable::new("A", "Grid area", "m²"),
                ],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "sverak_resistance",
            },
            Equation::SchwarzGridResistance => EquationMetadata {
                name: "Schwarz Grid Resistance R1",
                description: "Resistance of the horizontal grid alone",
                formula_plain: "R1 = rho/(pi*Lc) * [ln(2Lc/a') + k1*Lc/sqrt(A) - k2], a' = sqrt(a*2h)",
                reference: ieee("14.3"),
                variables: vec![
                    Variable::new("Lc", "Total grid conductor length", "m"),
                    Variable::new("a", "Conductor radius", "m"),
                    Variable::new("k1, k2", "Schwarz shape coefficients", "-"),
                ],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "schwarz_resistance",
            },
            Equation::SchwarzRodResistance => EquationMetadata {
                name: "Schwarz Rod Resistance R2",
                description: "Resistance of the rod bed alone",
                formula_plain: "R2 = rho/(2*pi*nr*Lr) * [ln(4Lr/b) - 1 + (2*k1*Lr/sqrt(A)) * (sqrt(nr) - 1)^2]",
                reference: ieee("14.3"),
                variables: vec![
                    Variable::new("nr", "Number of rods", "-"),
                    Variable::new("Lr", "Rod length", "m"),
                    Variable::new("b", "Rod radius", "m"),
                ],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "schwarz_resistance",
            },
            Equation::SchwarzMutualResistance => EquationMetadata {
                name: "Schwarz Mutual Resistance R12",
                description: "Mutual resistance between grid and rod bed",
                formula_plain: "R12 = rho/(pi*Lc) * [ln(2Lc/Lr) + k1*Lc/sqrt(A) - k2 + 1]",
                reference: ieee("14.3"),
                variables: vec![Variable::new("R12", "Mutual resistance", "Ω")],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "schwarz_resistance",
            },
            Equation::SchwarzCombinedResistance => EquationMetadata {
                name: "Schwarz Combined Resistance",
                description: "Resistance of grid and rods together",
                formula_plain: "Rg = (R1*R2 - R12^2)/(R1 + R2 - 2*R12)",
                reference: ieee("14.3"),
                variables: vec![Variable::new("Rg", "System resistance", "Ω")],
                category: Cat::Resistance,
                source_module: "equations/resistance.rs",
                source_function: "schwarz_resistance",
            },
            Equation::IrregularityFactor => EquationMetadata {
                name: "Irregularity Factor Ki",
                description: "Correction for current concentration at grid edges",
                formula_plain: "Ki = 0.656 + 0.172*n",
                reference: ieee("16.5"),
                variables: vec![Variable::new("n", "Effective number of parallel conductors", "-")],
                category: Cat::GeometricFactors,
                source_module: "equations/geometry.rs",
                source_function: "irregularity_factor",
            },
            Equation::TouchGeometryFactor => EquationMetadata {
                name: "Mesh Geometry Factor Km",
                description: "Geometric factor of the mesh voltage",
                formula_plain: "Km = 1/(2pi) * [ln(D^2/(16hd) + (D+2h)^2/(8Dd) - h/(4d)) + Kii/Kh * ln(8/(pi(2n-1)))]",
                reference: ieee("16.5.1"),
                variables: vec![
                    Variable::new("D", "Conductor spacing", "m"),
                    Variable::new("d", "Conductor diameter", "m"),
                    Variable::new("Kii", "1 with perimeter rods, (2n)^(-2/n) otherwise", "-"),
                    Variable::new("Kh", "sqrt(1 + h)", "-"),
                ],
                category: Cat::GeometricFactors,
                source_module: "equations/geometry.rs",
                source_function: "touch_geometry_factor",
            },
            Equation::StepGeometryFactor => EquationMetadata {
                name: "Step Geometry Factor Ks",
                description: "Geometric factor of the step voltage",
                formula_plain: "Ks = 1/pi * [1/(2h) + 1/(D+h) + (1/D)(1 - 0.5^(n-2))]",
                reference: ieee("16.5.2"),
                variables: vec![
                    Variable::new("D", "Conductor spacing", "m"),
                    Variable::new("h", "Burial depth", "m"),
                ],
                category: Cat::GeometricFactors,
                source_module: "equations/geometry.rs",
                source_function: "step_geometry_factor",
            },
            Equation::GridCurrent => EquationMetadata {
                name: "Grid Current",
                description: "Share of the fault current flowing between grid and remote earth",
                formula_plain: "Ig = If * 1000 * Sf/100",
                reference: ieee("15.1"),
                variables: vec![
                    Variable::new("If", "Fault current", "kA"),
                    Variable::new("Sf", "Current division factor", "%"),
                ],
                category: Cat::GridVoltages,
                source_module: "calculations/grounding.rs",
                source_function: "grid_current_a",
            },
            Equation::GroundPotentialRise => EquationMetadata {
                name: "Ground Potential Rise",
                description: "Maximum grid potential relative to remote earth",
                formula_plain: "GPR = Ig * Rg",
                reference: ieee("15.1"),
                variables: vec![Variable::new("GPR", "Ground potential rise", "V")],
                category: Cat::GridVoltages,
                source_module: "calculations/grounding.rs",
                source_function: "calculate",
            },
            Equation::MeshTouchVoltage => EquationMetadata {
                name: "Mesh Touch Voltage",
                description: "Touch voltage at the center of a corner mesh",
                formula_plain: "Em = rho * Ig * Km * Ki / Lt",
                reference: ieee("16.5.1"),
                variables: vec![Variable::new("Em", "Mesh voltage", "V")],
                category: Cat::GridVoltages,
                source_module: "equations/geometry.rs",
                source_function: "mesh_touch_voltage",
            },
            Equation::MeshStepVoltage => EquationMetadata {
                name: "Mesh Step Voltage",
                description: "Step voltage just outside the grid corner",
                formula_plain: "Es = rho * Ig * Ks * Ki / Lt",
                reference: ieee("16.5.2"),
                variables: vec![Variable::new("Es", "Step voltage", "V")],
                category: Cat::GridVoltages,
                source_module: "equations/geometry.rs",
                source_function: "mesh_step_voltage",
            },
            Equation::TolerableBodyCurrent => EquationMetadata {
                name: "Tolerable Body Current",
                description: "Body current limit for the fault duration",
                formula_plain: "Ib = k/sqrt(t) for t <= 3 s, Ib = 0.006 A for t > 3 s",
                reference: ieee("5.2"),
                variables: vec![
                    Variable::new("k", "0.116 (50 kg) or 0.157 (70 kg)", "A·√s"),
                    Variable::new("t", "Fault duration", "s"),
                ],
                category: Cat::PermissibleVoltages,
                source_module: "equations/permissible.rs",
                source_function: "tolerable_body_current",
            },
            Equation::DeratingFactor => EquationMetadata {
                name: "Surface Layer Derating Factor",
                description: "Reduction of foot resistance by a high-resistivity surface layer",
                formula_plain: "Cs = 1 - 0.09(1 - rho/rho_s)/(2hs + 0.09)",
                reference: ieee("7.4"),
                variables: vec![
                    Variable::new("rho_s", "Surface-layer resistivity", "Ω·m"),
                    Variable::new("hs", "Surface-layer thickness", "m"),
                ],
                category: Cat::PermissibleVoltages,
                source_module: "equations/permissible.rs",
                source_function: "derating_factor",
            },
            Equation::PermissibleTouchVoltage => EquationMetadata {
                name: "Permissible Touch Voltage",
                description: "Maximum tolerable touch voltage",
                formula_plain: "Etouch = (1000 + 1.5*Cs*rho_s) * Ib",
                reference: ieee("8.3"),
                variables: vec![Variable::new("Etouch", "Touch voltage limit", "V")],
                category: Cat::PermissibleVoltages,
                source_module: "equations/permissible.rs",
                source_function: "permissible_voltages",
            },
            Equation::PermissibleStepVoltage => EquationMetadata {
                name: "Permissible Step Voltage",
                description: "Maximum tolerable step voltage",
                formula_plain: "Estep = (1000 + 6*Cs*rho_s) * Ib",
                reference: ieee("8.3"),
                variables: vec![Variable::new("Estep", "Step voltage limit", "V")],
                category: Cat::PermissibleVoltages,
                source_module: "equations/permissible.rs",
                source_function: "permissible_voltages",
            },
            Equation::PresumedTouchVoltage => EquationMetadata {
                name: "Presumed Touch Voltage",
                description: "Tabulated touch voltage limit interpolated in log-log space",
                formula_plain: "log V = interp(log t) over 7 reference points, t in [0.01, 10] s",
                reference: CodeReference::PresumedTouchCurves,
                variables: vec![
                    Variable::new("t", "Fault duration", "s"),
                    Variable::new("V", "Presumed touch voltage", "V"),
                ],
                category: Cat::PermissibleVoltages,
                source_module: "equations/permissible.rs",
                source_function: "presumed_touch_voltage",
            },
            Equation::ThermalCoefficientKf => EquationMetadata {
                name: "Material Constant Kf",
                description: "Material constant of the conductor sizing equation",
                formula_plain: "Kf = sqrt(alpha20*rho20*1e4 / (TCAP * ln((Ko + Tm)/(Ko + Ta)))), Ko = 1/alpha20 - 20",
                reference: ieee("11.3.1"),
                variables: vec![
                    Variable::new("alpha20", "Thermal coefficient of resistivity at 20 °C", "1/°C"),
                    Variable::new("rho20", "Resistivity at 20 °C", "μΩ·cm"),
                    Variable::new("TCAP", "Thermal capacity", "J/(cm³·°C)"),
                    Variable::new("Tm", "Maximum allowable temperature", "°C"),
                    Variable::new("Ta", "Ambient temperature", "°C"),
                ],
                category: Cat::ConductorSizing,
                source_module: "equations/conductor.rs",
                source_function: "thermal_coefficient_kf",
            },
            Equation::MinimumConductorSection => EquationMetadata {
                name: "Minimum Conductor Section",
                description: "Smallest section surviving the fault without exceeding Tm",
                formula_plain: "A = If * Kf * sqrt(t)",
                reference: ieee("11.3.1"),
                variables: vec![
                    Variable::new("A", "Conductor section", "mm²"),
                    Variable::new("If", "Fault current", "kA"),
                ],
                category: Cat::ConductorSizing,
                source_module: "equations/conductor.rs",
                source_function: "minimum_conductor_section",
            },
            Equation::PointSourcePotential => EquationMetadata {
                name: "Point Source Superposition",
                description: "Normalized surface potential from discretized conductors and rods",
                formula_plain: "V(x, y) = sum(w_i / |p - s_i|), normalized by max V",
                reference: CodeReference::PointSourceApproximation,
                variables: vec![
                    Variable::new("w_i", "Source weight (1.0 grid, 1.5 rod)", "-"),
                    Variable::new("s_i", "Source position", "m"),
                ],
                category: Cat::PotentialField,
                source_module: "potential_field.rs",
                source_function: "compute_potential_field",
            },
        }
    }

    /// Get all equations in a given category
    pub fn in_category(category: EquationCategory) -> Vec<Equation> {
        ALL_EQUATIONS
            .iter()
            .filter(|eq| eq.metadata().category == category)
            .copied()
            .collect()
    }
}

/// All equations in the registry (for iteration)
pub static ALL_EQUATIONS: &[Equation] = &[
    Equation::EquivalentRadius,
    Equation::ReflectionCoefficient,
    Equation::ApparentResistivity,
    Equation::LaurentNiemannResistance,
    Equation::SverakResistance,
    Equation::SchwarzGridResistance,
    Equation::SchwarzRodResistance,
    Equation::SchwarzMutualResistance,
    Equation::SchwarzCombinedResistance,
    Equation::IrregularityFactor,
    Equation::TouchGeometryFactor,
    Equation::StepGeometryFactor,
    Equation::GridCurrent,
    Equation::GroundPotentialRise,
    Equation::MeshTouchVoltage,
    Equation::MeshStepVoltage,
    Equation::TolerableBodyCurrent,
    Equation::DeratingFactor,
    Equation::PermissibleTouchVoltage,
    Equation::PermissibleStepVoltage,
    Equation::PresumedTouchVoltage,
    Equation::ThermalCoefficientKf,
    Equation::MinimumConductorSection,
    Equation::PointSourcePotential,
];

// ============================================================================
// Equation Usage Tracking
// ============================================================================

/// Record of an equation being used in a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationUsage {
    pub equation: Equation,
    /// Where/why it was used (e.g., "Grid resistance")
    pub context: String,
}

impl EquationUsage {
    pub fn new(equation: Equation, context: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
        }
    }
}

/// Collector for equation usage during a calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationTracker {
    usages: Vec<EquationUsage>,
}

impl EquationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an equation was used
    pub fn record(&mut self, equation: Equation, context: impl Into<String>) {
        self.usages.push(EquationUsage::new(equation, context));
    }

    /// Get all recorded usages
    pub fn usages(&self) -> &[EquationUsage] {
        &self.usages
    }

    /// Get unique equations used, in first-use order
    pub fn unique_equations(&self) -> Vec<Equation> {
        let mut seen = HashSet::new();
        self.usages
            .iter()
            .filter(|u| seen.insert(u.equation))
            .map(|u| u.equation)
            .collect()
    }

    /// Group unique equations by category, in appendix order
    pub fn by_category(&self) -> Vec<(EquationCategory, Vec<Equation>)> {
        let mut by_cat: HashMap<EquationCategory, Vec<Equation>> = HashMap::new();
        for eq in self.unique_equations() {
            by_cat.entry(eq.metadata().category).or_default().push(eq);
        }

        let mut result: Vec<_> = by_cat.into_iter().collect();
        result.sort_by_key(|(cat, _)| cat.sort_order());
        result
    }

    /// Merge another tracker into this one
    pub fn merge(&mut self, other: EquationTracker) {
        self.usages.extend(other.usages);
    }
}

// ============================================================================
// Markdown Generation
// ============================================================================

/// Generate the markdown equations reference from the registry.
///
/// # Example
/// ```rust
/// use grid_core::equations::registry::generate_equations_markdown;
///
/// let markdown = generate_equations_markdown();
/// assert!(markdown.contains("## Grid Resistance"));
/// ```
pub fn generate_equations_markdown() -> String {
    let mut output = String::with_capacity(16_000);

    output.push_str(
        r#"# Terra Equations Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-equations`

Formulas used by the grounding-grid calculations, with their reference,
variables and implementing function.

## Units

| Quantity | Unit |
|----------|------|
| Length, depth, diameter | m |
| Resistivity | Ω·m |
| Fault current | kA (sizing), A (grid voltages) |
| Conductor section | mm² |
| Duration | s |

"#,
    );

    let mut category_count = 0;
    for category in EquationCategory::ALL {
        let equations = Equation::in_category(category);
        if equations.is_empty() {
            continue;
        }
        category_count += 1;

        output.push_str(&format!("## {}\n\n", category.display_name()));

        for equation in equations {
            let meta = equation.metadata();
            output.push_str(&format!("### {}\n\n", meta.name));
            output.push_str(&format!("{}\n\n", meta.description));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));

            if !meta.variables.is_empty() {
                output.push_str("| Symbol | Description | Units |\n");
                output.push_str("|--------|-------------|-------|\n");
                for var in &meta.variables {
                    output.push_str(&format!("| {} | {} | {} |\n", var.symbol, var.description, var.units));
                }
                output.push('\n');
            }

            output.push_str(&format!("**Reference:** {}\n\n", meta.reference.citation()));
            output.push_str(&format!(
                "**Source:** [`{}`]({})\n\n---\n\n",
                meta.source_function, meta.source_module
            ));
        }
    }

    output.push_str(&format!(
        "## Statistics\n\n- **Total Equations:** {}\n- **Categories:** {}\n",
        ALL_EQUATIONS.len(),
        category_count
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_equations_have_metadata() {
        assert_eq!(ALL_EQUATIONS.len(), 24);
        for eq in ALL_EQUATIONS {
            let meta = eq.metadata();
            assert!(!meta.name.is_empty(), "Equation {:?} has no name", eq);
            assert!(!meta.formula_plain.is_empty(), "Equation {:?} has no formula", eq);
            assert!(!meta.variables.is_empty(), "Equation {:?} has no variables", eq);
            assert!(!meta.source_function.is_empty(), "Equation {:?} missing source", eq);
        }
    }

    #[test]
    fn test_every_category_populated() {
        for cat in EquationCategory::ALL {
            assert!(!Equation::in_category(cat).is_empty(), "{:?} empty", cat);
        }
    }

    #[test]
    fn test_citation() {
        let r = CodeReference::Ieee80 { year: 2013, clause: "14.3" };
        assert_eq!(r.citation(), "IEEE Std 80-2013 Clause 14.3");
        assert_eq!(r.short_form(), "IEEE 80");
    }

    #[test]
    fn test_tracker_dedup_and_grouping() {
        let mut tracker = EquationTracker::new();
        tracker.record(Equation::SverakResistance, "Grid resistance");
        tracker.record(Equation::ApparentResistivity, "Soil");
        tracker.record(Equation::SverakResistance, "Again");

        assert_eq!(tracker.usages().len(), 3);
        assert_eq!(tracker.unique_equations().len(), 2);

        let by_cat = tracker.by_category();
        assert_eq!(by_cat.len(), 2);
        // Soil sorts before resistance
        assert_eq!(by_cat[0].0, EquationCategory::Soil);
        assert_eq!(by_cat[1].0, EquationCategory::Resistance);
    }

    #[test]
    fn test_markdown() {
        let md = generate_equations_markdown();
        assert!(md.contains("# Terra Equations Reference"));
        assert!(md.contains("### Grid Resistance (Sverak)"));
        assert!(md.contains("**Total Equations:** 24"));
        assert!(md.contains("**Categories:** 7"));
        assert!(md.contains("equations/conductor.rs"));
    }
}
