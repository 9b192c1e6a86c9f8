//! # Grounding Equations
//!
//! All formulas used by the grounding design pipeline live here as plain
//! functions of `f64` inputs. Keeping them in one place enables:
//! - Checking each formula against IEEE Std 80 clause by clause
//! - Documenting units next to the math
//! - Reusing the same function from calculations, CLI and tests
//!
//! ## Modules
//!
//! - [`interpolate`] - Piecewise lookup shared by tabulated curves
//! - [`soil`] - Equivalent radius, reflection coefficient, apparent resistivity
//! - [`resistance`] - Grid resistance by Laurent-Niemann, Sverak and Schwarz
//! - [`geometry`] - Irregularity, touch and step geometric factors; mesh voltages
//! - [`permissible`] - Body current, surface derating, permissible and presumed voltages
//! - [`conductor`] - Thermal sizing of grid conductors
//! - [`registry`] - Equation metadata and tracking for report appendices
//!
//! ## Units
//!
//! - **Lengths**: m (conductor sections in mm²)
//! - **Resistivity**: Ω·m (material ρ20 in μΩ·cm)
//! - **Currents**: A in voltage formulas, kA for fault input and sizing
//! - **Time**: s
//! - **Temperature**: °C
//!
//! ## References
//!
//! - IEEE Std 80-2013: Guide for Safety in AC Substation Grounding
//! - IEEE Std 80-2000 (Schwarz coefficient curves)

pub mod conductor;
pub mod geometry;
pub mod interpolate;
pub mod permissible;
pub mod registry;
pub mod resistance;
pub mod soil;

// Re-export commonly used items
pub use soil::{
    apparent_resistivity,
    apparent_resistivity_with,
    equivalent_radius,
    image_series_factor,
    reflection_coefficient,
    SeriesConfig,
};

pub use resistance::{
    laurent_niemann_resistance,
    schwarz_coefficients,
    schwarz_resistance,
    sverak_resistance,
    SchwarzCoefficients,
    SchwarzParams,
    SchwarzResult,
};

pub use geometry::{
    irregularity_factor,
    mesh_step_voltage,
    mesh_touch_voltage,
    step_geometry_factor,
    touch_geometry_factor,
};

pub use permissible::{
    derating_factor,
    max_step_voltage,
    max_touch_voltage,
    permissible_voltages,
    presumed_touch_voltage,
    tolerable_body_current,
    BodyCurrent,
    BodyWeight,
    DurationClass,
    InstallationArea,
    PermissibleVoltages,
};

pub use conductor::{minimum_conductor_section, thermal_coefficient_kf};

pub use registry::{
    generate_equations_markdown,
    CodeReference,
    Equation,
    EquationCategory,
    EquationMetadata,
    EquationTracker,
    EquationUsage,
    ALL_EQUATIONS,
};
