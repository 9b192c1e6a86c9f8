//! Standard Conductor Sections
//!
//! Commercial stranded conductor sizes (IEC 60228 series, mm²) used to pick
//! a real conductor once the minimum thermal section is known.

use std::f64::consts::PI;

/// Standard sections in ascending order (mm²)
pub const STANDARD_SECTIONS_MM2: [f64; 14] = [
    16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0, 300.0, 400.0, 500.0, 630.0,
];

/// Diameter of a solid round conductor of the given section.
///
/// # Formula
/// d = √(4·A/π), A in mm², d returned in m
///
/// # Example
/// ```rust
/// use grid_core::materials::diameter_from_section;
///
/// let d = diameter_from_section(50.0);
/// assert!((d - 0.0079788).abs() < 1e-6);
/// ```
pub fn diameter_from_section(section_mm2: f64) -> f64 {
    if section_mm2 <= 0.0 {
        return 0.0;
    }
    (4.0 * section_mm2 / PI).sqrt() / 1000.0
}

/// Smallest standard section at least as large as `required_mm2`.
///
/// Returns `None` if the requirement exceeds the largest standard size.
pub fn next_standard_section(required_mm2: f64) -> Option<f64> {
    STANDARD_SECTIONS_MM2
        .iter()
        .copied()
        .find(|&s| s >= required_mm2)
}
