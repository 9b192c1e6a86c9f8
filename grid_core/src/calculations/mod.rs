//! # Grounding Calculations
//!
//! Calculations follow the pattern:
//!
//! - `GroundingDesign` - Input (JSON-serializable, see [`crate::design`])
//! - `*Result` / `GroundingReport` - Stage and aggregate results (JSON-serializable)
//! - `calculate(design) -> Result<GroundingReport, CalcError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`grounding`] - Grid resistance, mesh voltages, permissible limits, conductor sizing

pub mod grounding;

// Re-export commonly used types
pub use grounding::{
    calculate, calculate_with, grid_current_a, ConductorCheck, GeometryResult, GroundingReport, ResistanceResult,
    SafetyLimits, SoilResult,
};
