//! # Project Data Structures
//!
//! The `Project` struct is the root container for grounding designs.
//! Projects serialize to `.gnd` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: GlobalSettings (standard, defaults, solver settings)
//! └── designs: HashMap<Uuid, GroundingDesign>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use grid_core::design::GroundingDesign;
//! use grid_core::project::Project;
//!
//! let mut project = Project::new("Jane Engineer", "25-042", "Utility Co");
//! let id = project.add_design(GroundingDesign::example());
//!
//! let reports = project.evaluate_all();
//! assert!(reports[&id].is_ok());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::grounding::{calculate_with, GroundingReport};
use crate::design::{GroundingDesign, ResistanceMethod};
use crate::equations::permissible::BodyWeight;
use crate::equations::soil::SeriesConfig;
use crate::errors::{CalcError, CalcResult};
use crate::potential_field::{compute_potential_field, FieldConfig, PotentialFieldGrid};

/// Current schema version for .gnd files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// Designs are stored in a flat UUID-keyed map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, engineer, job info)
    pub meta: ProjectMetadata,

    /// Global settings (standard edition, defaults, solver configuration)
    pub settings: GlobalSettings,

    /// All grounding designs, keyed by UUID
    pub designs: HashMap<Uuid, GroundingDesign>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use grid_core::project::Project;
    ///
    /// let project = Project::new("John Doe", "25-001", "Client Corp");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: GlobalSettings::default(),
            designs: HashMap::new(),
        }
    }

    /// Add a design; returns its new UUID.
    pub fn add_design(&mut self, design: GroundingDesign) -> Uuid {
        let id = Uuid::new_v4();
        self.designs.insert(id, design);
        self.touch();
        id
    }

    /// A blank-slate design using the project defaults.
    pub fn new_design(&self, label: impl Into<String>) -> GroundingDesign {
        let mut design = GroundingDesign::example();
        design.label = label.into();
        design.method = self.settings.default_method;
        design.body_weight = self.settings.default_body_weight;
        design
    }

    /// Remove a design by UUID.
    pub fn remove_design(&mut self, id: &Uuid) -> Option<GroundingDesign> {
        let design = self.designs.remove(id);
        if design.is_some() {
            self.touch();
        }
        design
    }

    pub fn get_design(&self, id: &Uuid) -> Option<&GroundingDesign> {
        self.designs.get(id)
    }

    /// Get a mutable reference to a design.
    ///
    /// Marks the project as modified when the design exists.
    pub fn get_design_mut(&mut self, id: &Uuid) -> Option<&mut GroundingDesign> {
        if self.designs.contains_key(id) {
            self.meta.modified = Utc::now();
            self.designs.get_mut(id)
        } else {
            None
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn design_count(&self) -> usize {
        self.designs.len()
    }

    /// Calculate one design with the project's series settings.
    pub fn evaluate(&self, id: &Uuid) -> CalcResult<GroundingReport> {
        let design = self
            .designs
            .get(id)
            .ok_or_else(|| CalcError::invalid_input("design_id", id.to_string(), "No design with this id"))?;
        calculate_with(design, &self.settings.series)
    }

    /// First design carrying `label`, with its id.
    pub fn find_design(&self, label: &str) -> Option<(Uuid, &GroundingDesign)> {
        self.designs
            .iter()
            .find(|(_, design)| design.label == label)
            .map(|(id, design)| (*id, design))
    }

    /// Surface potential field of one design, discretized with the project's
    /// field settings.
    pub fn potential_field(&self, id: &Uuid) -> CalcResult<PotentialFieldGrid> {
        let design = self
            .designs
            .get(id)
            .ok_or_else(|| CalcError::invalid_input("design_id", id.to_string(), "No design with this id"))?;
        design.validate()?;
        Ok(compute_potential_field(&design.grid, &design.rods, &self.settings.field))
    }

    /// Calculate every design. Failures are kept per design.
    pub fn evaluate_all(&self) -> HashMap<Uuid, CalcResult<GroundingReport>> {
        self.designs
            .iter()
            .map(|(id, design)| (*id, calculate_with(design, &self.settings.series)))
            .collect()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Global project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Grounding standard edition (e.g., "IEEE80-2013")
    pub standard: String,

    /// Body weight assumed for new designs
    pub default_body_weight: BodyWeight,

    /// Resistance method for new designs; `None` follows the burial depth
    pub default_method: Option<ResistanceMethod>,

    /// Image-charge series convergence control
    pub series: SeriesConfig,

    /// Potential field discretization and resolution
    pub field: FieldConfig,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            standard: "IEEE80-2013".to_string(),
            default_body_weight: BodyWeight::Kg50,
            default_method: None,
            series: SeriesConfig::default(),
            field: FieldConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = Project::new("John Doe", "25-001", "Acme Power");
        assert_eq!(project.meta.engineer, "John Doe");
        assert_eq!(project.meta.job_id, "25-001");
        assert_eq!(project.meta.client, "Acme Power");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.design_count(), 0);
    }

    #[test]
    fn test_project_serialization() {
        let project = Project::new("Jane Engineer", "25-042", "Test Client");
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Jane Engineer"));
        assert!(json.contains("IEEE80-2013"));
        assert!(json.contains("max_iterations"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.engineer, "Jane Engineer");
        assert_eq!(roundtrip.settings, project.settings);
    }

    #[test]
    fn test_add_remove_design() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        let id = project.add_design(GroundingDesign::example());
        assert_eq!(project.design_count(), 1);
        assert!(project.get_design(&id).is_some());

        project.get_design_mut(&id).unwrap().label = "Renamed".to_string();
        assert_eq!(project.get_design(&id).unwrap().label, "Renamed");

        let removed = project.remove_design(&id);
        assert!(removed.is_some());
        assert_eq!(project.design_count(), 0);
        assert!(project.remove_design(&id).is_none());
    }

    #[test]
    fn test_new_design_uses_defaults() {
        let mut project = Project::default();
        project.settings.default_body_weight = BodyWeight::Kg70;
        project.settings.default_method = Some(ResistanceMethod::Schwarz);
        let design = project.new_design("North yard");
        assert_eq!(design.label, "North yard");
        assert_eq!(design.body_weight, BodyWeight::Kg70);
        assert_eq!(design.resistance_method(), ResistanceMethod::Schwarz);
    }

    #[test]
    fn test_evaluate() {
        let mut project = Project::default();
        let good = project.add_design(GroundingDesign::example());
        let mut broken = GroundingDesign::example();
        broken.soil.rho1 = -5.0;
        let bad = project.add_design(broken);

        let reports = project.evaluate_all();
        assert_eq!(reports.len(), 2);
        assert!(reports[&good].is_ok());
        assert!(reports[&bad].is_err());

        assert!(project.evaluate(&Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_potential_field_uses_project_settings() {
        let mut project = Project::default();
        project.settings.field.resolution = 12;
        project.settings.field.margin_m = 4.0;
        let id = project.add_design(GroundingDesign::example());

        let field = project.potential_field(&id).unwrap();
        assert_eq!(field.resolution, 12);
        assert_eq!(field.values.len(), 12);
        assert_eq!(field.width_m, 58.0);

        project.get_design_mut(&id).unwrap().grid.nx = 0;
        assert!(project.potential_field(&id).is_err());
        assert!(project.potential_field(&Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_find_design_by_label() {
        let mut project = Project::default();
        let design = project.new_design("South yard");
        let id = project.add_design(design);
        assert_eq!(project.find_design("South yard").map(|(found, _)| found), Some(id));
        assert!(project.find_design("Nowhere").is_none());
    }

    #[test]
    fn test_settings_missing_fields_default() {
        let settings: GlobalSettings = serde_json::from_str(r#"{ "standard": "IEEE80-2000" }"#).unwrap();
        assert_eq!(settings.standard, "IEEE80-2000");
        assert_eq!(settings.series, SeriesConfig::default());
        assert_eq!(settings.field.resolution, 60);
    }
}
