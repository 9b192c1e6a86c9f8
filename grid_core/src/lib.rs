//! # grid_core - Substation Grounding Grid Calculation Engine
//!
//! `grid_core` computes the design parameters of a substation grounding grid:
//! apparent soil resistivity, grid resistance, mesh touch and step voltages,
//! permissible body voltages, the thermal minimum conductor section and a
//! normalized surface potential field for heatmaps. All inputs and outputs
//! are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All design and result types implement Serialize/Deserialize
//! - **Neutral values in formulas**: Invalid numeric domains give 0 or `None`, never NaN
//! - **Rich Errors**: Structured errors above the formula layer
//!
//! ## Quick Start
//!
//! ```rust
//! use grid_core::calculations::calculate;
//! use grid_core::design::GroundingDesign;
//!
//! let design = GroundingDesign::example();
//! let report = calculate(&design).unwrap();
//!
//! assert!(report.resistance.resistance_ohm > 1.0);
//! let json = serde_json::to_string_pretty(&report).unwrap();
//! # assert!(json.contains("mesh_touch_v"));
//! ```
//!
//! ## Modules
//!
//! - [`equations`] - Pure formulas (soil, resistance, geometric factors, limits, sizing)
//! - [`potential_field`] - Point-source surface potential visualization
//! - [`design`] - Immutable design state
//! - [`calculations`] - Pipeline stages and the aggregated safety report
//! - [`materials`] - Conductor material and connection catalogs
//! - [`project`] - Project container, metadata, and settings
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod calculations;
pub mod design;
pub mod equations;
pub mod errors;
pub mod file_io;
pub mod materials;
pub mod potential_field;
pub mod project;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, GroundingReport};
pub use design::GroundingDesign;
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use potential_field::{compute_potential_field, FieldConfig, PotentialFieldGrid};
pub use project::{GlobalSettings, Project, ProjectMetadata};
