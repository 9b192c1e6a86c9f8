//! # Materials Database
//!
//! Conductor materials, joint types and standard sections for grounding
//! grid design.
//!
//! ## Example
//!
//! ```rust
//! use grid_core::materials::{lookup_connection, lookup_material, max_design_temperature};
//!
//! let material = lookup_material("copper_hard_drawn").unwrap();
//! let connection = lookup_connection("brazed").unwrap();
//!
//! assert_eq!(max_design_temperature(material, connection), 450.0);
//! ```

pub mod catalog;
pub mod conductor_sizes;

pub use catalog::{
    conductor_materials, connection_types, lookup_connection, lookup_material, max_design_temperature,
    ConductorMaterial, ConnectionType, DEFAULT_CONNECTION_ID, DEFAULT_MATERIAL_ID,
};

pub use conductor_sizes::{diameter_from_section, next_standard_section, STANDARD_SECTIONS_MM2};
