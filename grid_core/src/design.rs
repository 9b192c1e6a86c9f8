//! # Grounding Design State
//!
//! One immutable value holding every input of a grounding-grid design: soil,
//! grid geometry, rods, fault, surface layer, conductor choice and the
//! method/assumption selections. Calculation stages are pure functions of
//! (parts of) this value, so any input change is handled by recomputing.
//!
//! ## Units
//!
//! - Lengths and depths in m, conductor sections in mm²
//! - Resistivities in Ω·m
//! - Fault current in kA, duration in s
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "label": "Substation 132/20 kV",
//!   "soil": { "model": "homogeneous", "rho1": 100.0 },
//!   "grid": {
//!     "lx_m": 50.0, "ly_m": 40.0, "nx": 11, "ny": 9,
//!     "depth_m": 0.5, "conductor_diameter_m": 0.0079788
//!   },
//!   "rods": { "positions": [{ "i": 0, "j": 0 }], "length_m": 3.0, "diameter_m": 0.016 },
//!   "fault": { "current_ka": 10.0, "division_pct": 60.0, "duration_s": 0.5 },
//!   "surface_layer": { "resistivity": 3000.0, "thickness_m": 0.1 },
//!   "conductor": {
//!     "material_id": "copper_annealed", "connection_id": "exothermic",
//!     "section_mm2": 50.0, "ambient_temp_c": 40.0
//!   },
//!   "method": "sverak",
//!   "body_weight": "50kg",
//!   "installation_area": "internal"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::equations::permissible::{BodyWeight, InstallationArea};
use crate::equations::soil::{apparent_resistivity_with, SeriesConfig};
use crate::errors::{CalcError, CalcResult};
use crate::materials::{diameter_from_section, DEFAULT_CONNECTION_ID, DEFAULT_MATERIAL_ID};

// ============================================================================
// Soil
// ============================================================================

/// Soil structure assumed for the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilModelKind {
    #[default]
    Homogeneous,
    TwoLayer,
}

/// Measured soil resistivity profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub model: SoilModelKind,
    /// Upper layer (or uniform) resistivity (Ω·m)
    pub rho1: f64,
    /// Lower layer resistivity (Ω·m), two-layer only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho2: Option<f64>,
    /// Upper layer thickness (m), two-layer only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_depth_m: Option<f64>,
}

impl SoilProfile {
    pub fn homogeneous(rho: f64) -> Self {
        SoilProfile {
            model: SoilModelKind::Homogeneous,
            rho1: rho,
            rho2: None,
            layer_depth_m: None,
        }
    }

    pub fn two_layer(rho1: f64, rho2: f64, layer_depth_m: f64) -> Self {
        SoilProfile {
            model: SoilModelKind::TwoLayer,
            rho1,
            rho2: Some(rho2),
            layer_depth_m: Some(layer_depth_m),
        }
    }

    /// Resistivity seen by a grid of equivalent radius `r` (m).
    pub fn apparent_resistivity(&self, r: f64, config: &SeriesConfig) -> f64 {
        match self.model {
            SoilModelKind::Homogeneous => self.rho1,
            SoilModelKind::TwoLayer => {
                apparent_resistivity_with(self.rho1, self.rho2, self.layer_depth_m.unwrap_or(0.0), r, config)
            }
        }
    }
}

// ============================================================================
// Grid and rods
// ============================================================================

/// Rectangular mesh of buried horizontal conductors.
///
/// `nx` conductors run parallel to the y axis, spaced along x; `ny`
/// conductors run parallel to the x axis, spaced along y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Grid length along x (m)
    pub lx_m: f64,
    /// Grid width along y (m)
    pub ly_m: f64,
    /// Number of conductors parallel to y
    pub nx: usize,
    /// Number of conductors parallel to x
    pub ny: usize,
    /// Burial depth (m)
    pub depth_m: f64,
    /// Conductor diameter (m)
    pub conductor_diameter_m: f64,
}

impl GridGeometry {
    /// A = lx·ly (m²)
    pub fn area(&self) -> f64 {
        self.lx_m * self.ly_m
    }

    /// Lc = nx·ly + ny·lx (m)
    pub fn total_conductor_length(&self) -> f64 {
        self.nx as f64 * self.ly_m + self.ny as f64 * self.lx_m
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.lx_m + self.ly_m)
    }

    /// Distance between adjacent conductors along x (0 with fewer than 2)
    pub fn spacing_x(&self) -> f64 {
        if self.nx < 2 {
            0.0
        } else {
            self.lx_m / (self.nx - 1) as f64
        }
    }

    /// Distance between adjacent conductors along y (0 with fewer than 2)
    pub fn spacing_y(&self) -> f64 {
        if self.ny < 2 {
            0.0
        } else {
            self.ly_m / (self.ny - 1) as f64
        }
    }

    /// Mesh spacing D used by the geometric factors: mean of both spacings.
    pub fn mesh_spacing(&self) -> f64 {
        0.5 * (self.spacing_x() + self.spacing_y())
    }

    /// Long side over short side (≥ 1), 0 if either side is not positive.
    pub fn length_width_ratio(&self) -> f64 {
        let (long, short) = if self.lx_m >= self.ly_m {
            (self.lx_m, self.ly_m)
        } else {
            (self.ly_m, self.lx_m)
        };
        if short <= 0.0 {
            0.0
        } else {
            long / short
        }
    }

    /// Effective number of parallel conductors: n = Lc / (Lp/2).
    pub fn effective_conductor_count(&self) -> f64 {
        let half_perimeter = self.lx_m + self.ly_m;
        if half_perimeter <= 0.0 {
            0.0
        } else {
            self.total_conductor_length() / half_perimeter
        }
    }

    /// Plan position (x, y) of conductor crossing (i, j).
    pub fn node_position(&self, i: usize, j: usize) -> (f64, f64) {
        (i as f64 * self.spacing_x(), j as f64 * self.spacing_y())
    }

    /// True when (i, j) lies on the outer ring of the mesh.
    pub fn is_perimeter_node(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i + 1 == self.nx || j + 1 == self.ny
    }
}

/// Grid crossing index of a vertical rod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RodPosition {
    pub i: usize,
    pub j: usize,
}

/// Vertical ground rods sharing one length and diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RodSet {
    pub positions: Vec<RodPosition>,
    /// Rod length (m)
    pub length_m: f64,
    /// Rod diameter (m)
    pub diameter_m: f64,
}

impl Default for RodSet {
    fn default() -> Self {
        RodSet {
            positions: Vec::new(),
            length_m: 3.0,
            diameter_m: 0.016,
        }
    }
}

impl RodSet {
    /// Rods inside `[0, nx) × [0, ny)`, first occurrence of each node only.
    pub fn valid_positions(&self, nx: usize, ny: usize) -> Vec<RodPosition> {
        let mut seen = HashSet::new();
        self.positions
            .iter()
            .copied()
            .filter(|p| p.i < nx && p.j < ny)
            .filter(|p| seen.insert(*p))
            .collect()
    }

    pub fn valid_count(&self, grid: &GridGeometry) -> usize {
        self.valid_positions(grid.nx, grid.ny).len()
    }

    /// LR = nr·Lr (m)
    pub fn total_length(&self, grid: &GridGeometry) -> f64 {
        self.valid_count(grid) as f64 * self.length_m.max(0.0)
    }

    /// True when any valid rod sits on a perimeter node.
    pub fn has_perimeter_rods(&self, grid: &GridGeometry) -> bool {
        self.valid_positions(grid.nx, grid.ny)
            .iter()
            .any(|p| grid.is_perimeter_node(p.i, p.j))
    }
}

// ============================================================================
// Fault, surface layer, conductor
// ============================================================================

/// Ground fault seen by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultCurrent {
    /// Total single-line-to-ground fault current (kA)
    pub current_ka: f64,
    /// Share of the fault current that flows through the grid (%)
    pub division_pct: f64,
    /// Fault clearing time (s)
    pub duration_s: f64,
}

impl FaultCurrent {
    /// Current flowing into the grid: Ig = If·1000·Sf/100 (A)
    pub fn grid_current_a(&self) -> f64 {
        self.current_ka * 1000.0 * self.division_pct / 100.0
    }
}

/// High-resistivity surface layer (crushed rock, gravel).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLayer {
    /// Layer resistivity (Ω·m)
    pub resistivity: f64,
    /// Layer thickness (m)
    pub thickness_m: f64,
}

/// Conductor material, joint type and chosen cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorSelection {
    pub material_id: String,
    pub connection_id: String,
    /// Installed cross-section (mm²)
    pub section_mm2: f64,
    /// Ambient soil temperature (°C)
    pub ambient_temp_c: f64,
}

impl Default for ConductorSelection {
    fn default() -> Self {
        ConductorSelection {
            material_id: DEFAULT_MATERIAL_ID.to_string(),
            connection_id: DEFAULT_CONNECTION_ID.to_string(),
            section_mm2: 50.0,
            ambient_temp_c: 40.0,
        }
    }
}

// ============================================================================
// Method selection
// ============================================================================

/// Grid resistance method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceMethod {
    /// Method A: Laurent-Niemann, shallow grids
    LaurentNiemann,
    /// Method B: Sverak, depth-corrected
    Sverak,
    /// Method C: Schwarz, combined grid and rods
    Schwarz,
}

impl ResistanceMethod {
    pub const ALL: [ResistanceMethod; 3] = [
        ResistanceMethod::LaurentNiemann,
        ResistanceMethod::Sverak,
        ResistanceMethod::Schwarz,
    ];

    /// Method suited to a burial depth:
    /// A for h ≤ 0.25 m, B for 0.25 < h < 2.5 m, C otherwise.
    pub fn recommended_for_depth(depth_m: f64) -> Self {
        if depth_m <= 0.25 {
            ResistanceMethod::LaurentNiemann
        } else if depth_m < 2.5 {
            ResistanceMethod::Sverak
        } else {
            ResistanceMethod::Schwarz
        }
    }

    pub fn letter(&self) -> char {
        match self {
            ResistanceMethod::LaurentNiemann => 'A',
            ResistanceMethod::Sverak => 'B',
            ResistanceMethod::Schwarz => 'C',
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResistanceMethod::LaurentNiemann => "Laurent-Niemann",
            ResistanceMethod::Sverak => "Sverak",
            ResistanceMethod::Schwarz => "Schwarz",
        }
    }
}

// ============================================================================
// Design
// ============================================================================

/// Complete input of one grounding-grid design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingDesign {
    /// User label (e.g., "Substation North")
    pub label: String,
    pub soil: SoilProfile,
    pub grid: GridGeometry,
    #[serde(default)]
    pub rods: RodSet,
    pub fault: FaultCurrent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_layer: Option<SurfaceLayer>,
    #[serde(default)]
    pub conductor: ConductorSelection,
    /// Resistance method; `None` picks one from the burial depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ResistanceMethod>,
    #[serde(default)]
    pub body_weight: BodyWeight,
    #[serde(default)]
    pub installation_area: InstallationArea,
}

fn positive(field: &str, value: f64, reason: &str) -> CalcResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), reason))
    }
}

impl GroundingDesign {
    /// A 50 × 40 m grid, 11 × 9 conductors of 50 mm² copper at 0.5 m in
    /// 100 Ω·m soil, 10 kA / 0.5 s fault, 60 % of it into the grid, 0.1 m of
    /// 3000 Ω·m gravel.
    pub fn example() -> Self {
        GroundingDesign {
            label: "Example substation".to_string(),
            soil: SoilProfile::homogeneous(100.0),
            grid: GridGeometry {
                lx_m: 50.0,
                ly_m: 40.0,
                nx: 11,
                ny: 9,
                depth_m: 0.5,
                conductor_diameter_m: diameter_from_section(50.0),
            },
            rods: RodSet::default(),
            fault: FaultCurrent {
                current_ka: 10.0,
                division_pct: 60.0,
                duration_s: 0.5,
            },
            surface_layer: Some(SurfaceLayer {
                resistivity: 3000.0,
                thickness_m: 0.1,
            }),
            conductor: ConductorSelection::default(),
            method: None,
            body_weight: BodyWeight::Kg50,
            installation_area: InstallationArea::Internal,
        }
    }

    /// Method used for this design (explicit choice or depth recommendation).
    pub fn resistance_method(&self) -> ResistanceMethod {
        self.method
            .unwrap_or_else(|| ResistanceMethod::recommended_for_depth(self.grid.depth_m))
    }

    /// Check data-model invariants; returns the first violation.
    pub fn validate(&self) -> CalcResult<()> {
        positive("soil.rho1", self.soil.rho1, "Soil resistivity must be positive")?;
        if self.soil.model == SoilModelKind::TwoLayer {
            let rho2 = self
                .soil
                .rho2
                .ok_or_else(|| CalcError::missing_field("soil.rho2"))?;
            positive("soil.rho2", rho2, "Lower layer resistivity must be positive")?;
            let h1 = self
                .soil
                .layer_depth_m
                .ok_or_else(|| CalcError::missing_field("soil.layer_depth_m"))?;
            positive("soil.layer_depth_m", h1, "Upper layer thickness must be positive")?;
        }

        let grid = &self.grid;
        positive("grid.lx_m", grid.lx_m, "Grid length must be positive")?;
        positive("grid.ly_m", grid.ly_m, "Grid width must be positive")?;
        if grid.nx < 2 {
            return Err(CalcError::invalid_input(
                "grid.nx",
                grid.nx.to_string(),
                "At least 2 conductors are needed along each axis",
            ));
        }
        if grid.ny < 2 {
            return Err(CalcError::invalid_input(
                "grid.ny",
                grid.ny.to_string(),
                "At least 2 conductors are needed along each axis",
            ));
        }
        positive("grid.depth_m", grid.depth_m, "Burial depth must be positive")?;
        positive(
            "grid.conductor_diameter_m",
            grid.conductor_diameter_m,
            "Conductor diameter must be positive",
        )?;

        if !self.rods.positions.is_empty() {
            positive("rods.length_m", self.rods.length_m, "Rod length must be positive")?;
            positive("rods.diameter_m", self.rods.diameter_m, "Rod diameter must be positive")?;
            if let Some(p) = self.rods.positions.iter().find(|p| p.i >= grid.nx || p.j >= grid.ny) {
                return Err(CalcError::invalid_input(
                    "rods.positions",
                    format!("({}, {})", p.i, p.j),
                    format!("Rod index outside the {}×{} grid", grid.nx, grid.ny),
                ));
            }
        }

        positive("fault.current_ka", self.fault.current_ka, "Fault current must be positive")?;
        let div = self.fault.division_pct;
        if !(0.0..=100.0).contains(&div) {
            return Err(CalcError::invalid_input(
                "fault.division_pct",
                div.to_string(),
                "Current division must be between 0 and 100 %",
            ));
        }
        positive("fault.duration_s", self.fault.duration_s, "Fault duration must be positive")?;

        if let Some(layer) = &self.surface_layer {
            positive(
                "surface_layer.resistivity",
                layer.resistivity,
                "Surface layer resistivity must be positive",
            )?;
            if layer.thickness_m.is_nan() || layer.thickness_m < 0.0 {
                return Err(CalcError::invalid_input(
                    "surface_layer.thickness_m",
                    layer.thickness_m.to_string(),
                    "Surface layer thickness cannot be negative",
                ));
            }
        }

        positive(
            "conductor.section_mm2",
            self.conductor.section_mm2,
            "Conductor section must be positive",
        )?;
        if !self.conductor.ambient_temp_c.is_finite() {
            return Err(CalcError::invalid_input(
                "conductor.ambient_temp_c",
                self.conductor.ambient_temp_c.to_string(),
                "Ambient temperature must be a number",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridGeometry {
        GroundingDesign::example().grid
    }

    #[test]
    fn test_grid_derived_quantities() {
        let g = grid();
        assert_eq!(g.area(), 2000.0);
        assert_eq!(g.total_conductor_length(), 890.0);
        assert_eq!(g.perimeter(), 180.0);
        assert_eq!(g.spacing_x(), 5.0);
        assert_eq!(g.spacing_y(), 5.0);
        assert_eq!(g.mesh_spacing(), 5.0);
        assert_eq!(g.length_width_ratio(), 1.25);
        assert!((g.effective_conductor_count() - 9.888889).abs() < 1e-6);
        assert_eq!(g.node_position(10, 8), (50.0, 40.0));
    }

    #[test]
    fn test_length_width_ratio_orientation() {
        let g = GridGeometry {
            lx_m: 20.0,
            ly_m: 60.0,
            ..grid()
        };
        assert_eq!(g.length_width_ratio(), 3.0);
    }

    #[test]
    fn test_single_conductor_spacing() {
        let g = GridGeometry { nx: 1, ..grid() };
        assert_eq!(g.spacing_x(), 0.0);
        assert_eq!(g.node_position(0, 2), (0.0, 10.0));
    }

    #[test]
    fn test_rod_filtering() {
        let g = grid();
        let rods = RodSet {
            positions: vec![
                RodPosition { i: 5, j: 4 },
                RodPosition { i: 5, j: 4 },
                RodPosition { i: 11, j: 0 },
                RodPosition { i: 0, j: 3 },
            ],
            ..RodSet::default()
        };
        let valid = rods.valid_positions(g.nx, g.ny);
        assert_eq!(valid, vec![RodPosition { i: 5, j: 4 }, RodPosition { i: 0, j: 3 }]);
        assert_eq!(rods.total_length(&g), 6.0);
        assert!(rods.has_perimeter_rods(&g));
    }

    #[test]
    fn test_interior_rods_not_perimeter() {
        let g = grid();
        let rods = RodSet {
            positions: vec![RodPosition { i: 5, j: 4 }, RodPosition { i: 9, j: 7 }, RodPosition { i: 1, j: 1 }],
            ..RodSet::default()
        };
        assert_eq!(rods.valid_count(&g), 3);
        assert!(!rods.has_perimeter_rods(&g));
    }

    #[test]
    fn test_corner_rod_is_perimeter() {
        let g = grid();
        assert!(g.is_perimeter_node(10, 8));
        assert!(!g.is_perimeter_node(9, 7));
        let rods = RodSet {
            positions: vec![RodPosition { i: 5, j: 4 }, RodPosition { i: 10, j: 8 }],
            ..RodSet::default()
        };
        assert!(rods.has_perimeter_rods(&g));
    }

    #[test]
    fn test_method_recommendation() {
        assert_eq!(ResistanceMethod::recommended_for_depth(0.25), ResistanceMethod::LaurentNiemann);
        assert_eq!(ResistanceMethod::recommended_for_depth(0.5), ResistanceMethod::Sverak);
        assert_eq!(ResistanceMethod::recommended_for_depth(2.5), ResistanceMethod::Schwarz);
        assert_eq!(GroundingDesign::example().resistance_method(), ResistanceMethod::Sverak);
    }

    #[test]
    fn test_grid_current() {
        let fault = GroundingDesign::example().fault;
        assert!((fault.grid_current_a() - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn test_homogeneous_apparent_resistivity() {
        let soil = SoilProfile::homogeneous(250.0);
        assert_eq!(soil.apparent_resistivity(25.0, &SeriesConfig::default()), 250.0);
    }

    #[test]
    fn test_two_layer_equal_resistivities() {
        let soil = SoilProfile::two_layer(100.0, 100.0, 2.0);
        assert_eq!(soil.apparent_resistivity(5.0, &SeriesConfig::default()), 100.0);
    }

    #[test]
    fn test_example_is_valid() {
        assert!(GroundingDesign::example().validate().is_ok());
    }

    #[test]
    fn test_validate_two_layer_requires_lower_layer() {
        let mut design = GroundingDesign::example();
        design.soil = SoilProfile {
            model: SoilModelKind::TwoLayer,
            rho1: 100.0,
            rho2: None,
            layer_depth_m: Some(2.0),
        };
        assert_eq!(design.validate().unwrap_err().error_code(), "MISSING_FIELD");

        design.soil = SoilProfile::two_layer(100.0, 200.0, 0.0);
        assert_eq!(design.validate().unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_validate_rejects_bad_inputs() {
        let mut design = GroundingDesign::example();
        design.grid.nx = 1;
        assert!(design.validate().is_err());

        let mut design = GroundingDesign::example();
        design.fault.division_pct = 120.0;
        assert!(design.validate().is_err());

        let mut design = GroundingDesign::example();
        design.fault.duration_s = 0.0;
        assert!(design.validate().is_err());

        let mut design = GroundingDesign::example();
        design.rods.positions.push(RodPosition { i: 0, j: 9 });
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_with_defaults() {
        let json = r#"{
            "label": "Minimal",
            "soil": { "model": "homogeneous", "rho1": 80.0 },
            "grid": { "lx_m": 30.0, "ly_m": 30.0, "nx": 7, "ny": 7, "depth_m": 0.6, "conductor_diameter_m": 0.01 },
            "fault": { "current_ka": 5.0, "division_pct": 100.0, "duration_s": 1.0 }
        }"#;
        let design: GroundingDesign = serde_json::from_str(json).unwrap();
        assert!(design.rods.positions.is_empty());
        assert_eq!(design.conductor.material_id, "copper_annealed");
        assert_eq!(design.body_weight, BodyWeight::Kg50);
        assert!(design.surface_layer.is_none());
        assert!(design.validate().is_ok());

        let back: GroundingDesign = serde_json::from_str(&serde_json::to_string(&design).unwrap()).unwrap();
        assert_eq!(back, design);
    }
}
