//! # Surface Potential Field
//!
//! Coarse visualization of the ground potential above a grid. Every grid
//! conductor is discretized into point sources at burial depth, every rod
//! adds a few heavier sources along its length, and the surface potential of
//! each output cell is the superposition `Σ w/r` over all sources.
//!
//! This is a visualization aid, not a field solver: the result is normalized
//! to [0, 1] and carries no physical units.
//!
//! ## Cost
//!
//! O(R²·S) for an R×R output and S sources. No spatial pruning is applied:
//! distant sources shape the global field. Rows are evaluated in parallel
//! when the `parallel` feature is enabled.
//!
//! ## Example
//!
//! ```rust
//! use grid_core::design::{GridGeometry, RodSet};
//! use grid_core::potential_field::{compute_potential_field, step_visualization, FieldConfig};
//!
//! let grid = GridGeometry {
//!     lx_m: 20.0,
//!     ly_m: 10.0,
//!     nx: 5,
//!     ny: 3,
//!     depth_m: 0.5,
//!     conductor_diameter_m: 0.008,
//! };
//! let config = FieldConfig { resolution: 20, ..FieldConfig::default() };
//! let field = compute_potential_field(&grid, &RodSet::default(), &config);
//!
//! assert_eq!(field.values.len(), 20);
//! let step = step_visualization(&field.values);
//! assert!(step.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::design::{GridGeometry, RodSet};

/// Upper bound on the output resolution per axis
pub const MAX_FIELD_RESOLUTION: usize = 400;

/// Lower bound on the output resolution per axis
pub const MIN_FIELD_RESOLUTION: usize = 2;

/// Sources closer than this to a surface point are treated as this far away
pub const MIN_SOURCE_DISTANCE_M: f64 = 0.01;

/// Discretization and output settings for the potential field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Output cells per axis (clamped to [2, 400])
    pub resolution: usize,
    /// Margin around the grid footprint (m)
    pub margin_m: f64,
    /// Target spacing between sources along a conductor (m)
    pub point_spacing_m: f64,
    /// Minimum sources per conductor
    pub min_points_per_conductor: usize,
    /// Sources per rod
    pub rod_points: usize,
    /// Weight of grid conductor sources
    pub grid_weight: f64,
    /// Weight of rod sources
    pub rod_weight: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            resolution: 60,
            margin_m: 1.5,
            point_spacing_m: 1.5,
            min_points_per_conductor: 5,
            rod_points: 3,
            grid_weight: 1.0,
            rod_weight: 1.5,
        }
    }
}

impl FieldConfig {
    /// Resolution after clamping
    pub fn effective_resolution(&self) -> usize {
        self.resolution.clamp(MIN_FIELD_RESOLUTION, MAX_FIELD_RESOLUTION)
    }
}

/// A weighted point source below the surface (z ≤ 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub weight: f64,
}

/// Normalized potential over the grid footprint plus margin.
///
/// `values[i][j]` is the cell at row `i` (y direction) and column `j`
/// (x direction); row 0 / column 0 sit at `(offset_x_m, offset_y_m)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialFieldGrid {
    pub values: Vec<Vec<f64>>,
    pub resolution: usize,
    /// Physical width covered (m)
    pub width_m: f64,
    /// Physical height covered (m)
    pub height_m: f64,
    /// x of the first column (m)
    pub offset_x_m: f64,
    /// y of the first row (m)
    pub offset_y_m: f64,
    /// Number of point sources used
    pub source_count: usize,
}

fn points_along(length_m: f64, config: &FieldConfig) -> usize {
    let by_density = if config.point_spacing_m > 0.0 {
        (length_m / config.point_spacing_m).round() as usize
    } else {
        0
    };
    by_density.max(config.min_points_per_conductor).max(2)
}

fn conductor_offset(index: usize, count: usize, length_m: f64) -> f64 {
    if count < 2 {
        return 0.0;
    }
    index as f64 * length_m / (count - 1) as f64
}

/// Discretize grid conductors and rods into point sources.
///
/// - `nx` conductors run along y at `x = i·lx/(nx−1)`; `ny` conductors run
///   along x at `y = j·ly/(ny−1)`. Each gets evenly spaced sources including
///   both ends, at `z = −depth`, with `grid_weight`.
/// - Each valid rod adds `rod_points` sources at
///   `z = −(depth + Lr·k/rod_points)`, k = 1..=rod_points, with `rod_weight`.
pub fn discretize_sources(grid: &GridGeometry, rods: &RodSet, config: &FieldConfig) -> Vec<PointSource> {
    let z = -grid.depth_m;
    let mut sources = Vec::new();

    let per_vertical = points_along(grid.ly_m, config);
    for i in 0..grid.nx {
        let x = conductor_offset(i, grid.nx, grid.lx_m);
        for k in 0..per_vertical {
            sources.push(PointSource {
                x,
                y: conductor_offset(k, per_vertical, grid.ly_m),
                z,
                weight: config.grid_weight,
            });
        }
    }

    let per_horizontal = points_along(grid.lx_m, config);
    for j in 0..grid.ny {
        let y = conductor_offset(j, grid.ny, grid.ly_m);
        for k in 0..per_horizontal {
            sources.push(PointSource {
                x: conductor_offset(k, per_horizontal, grid.lx_m),
                y,
                z,
                weight: config.grid_weight,
            });
        }
    }

    let rod_length = rods.length_m.max(0.0);
    for rod in rods.valid_positions(grid.nx, grid.ny) {
        let (x, y) = grid.node_position(rod.i, rod.j);
        for k in 1..=config.rod_points {
            sources.push(PointSource {
                x,
                y,
                z: z - rod_length * k as f64 / config.rod_points as f64,
                weight: config.rod_weight,
            });
        }
    }

    sources
}

#[inline]
fn potential_at(x: f64, y: f64, sources: &[PointSource]) -> f64 {
    sources
        .iter()
        .map(|s| {
            let (dx, dy, dz) = (x - s.x, y - s.y, s.z);
            let distance = (dx * dx + dy * dy + dz * dz).sqrt().max(MIN_SOURCE_DISTANCE_M);
            s.weight / distance
        })
        .sum()
}

/// Compute the normalized surface potential field.
///
/// Every value lies in [0, 1]; the maximum cell equals 1 unless there are no
/// sources, in which case the matrix is all zeros.
pub fn compute_potential_field(grid: &GridGeometry, rods: &RodSet, config: &FieldConfig) -> PotentialFieldGrid {
    let resolution = config.effective_resolution();
    let margin = config.margin_m.max(0.0);
    let width = grid.lx_m.max(0.0) + 2.0 * margin;
    let height = grid.ly_m.max(0.0) + 2.0 * margin;
    let (offset_x, offset_y) = (-margin, -margin);

    let sources = discretize_sources(grid, rods, config);
    debug!(
        sources = sources.len(),
        resolution,
        "computing surface potential field"
    );

    let step_x = width / (resolution - 1) as f64;
    let step_y = height / (resolution - 1) as f64;
    let row = |i: usize| -> Vec<f64> {
        let y = offset_y + i as f64 * step_y;
        (0..resolution)
            .map(|j| potential_at(offset_x + j as f64 * step_x, y, &sources))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let mut values: Vec<Vec<f64>> = (0..resolution).into_par_iter().map(row).collect();
    #[cfg(not(feature = "parallel"))]
    let mut values: Vec<Vec<f64>> = (0..resolution).map(row).collect();

    normalize_by_max(&mut values);

    PotentialFieldGrid {
        values,
        resolution,
        width_m: width,
        height_m: height,
        offset_x_m: offset_x,
        offset_y_m: offset_y,
        source_count: sources.len(),
    }
}

fn normalize_by_max(values: &mut [Vec<f64>]) {
    let max = values.iter().flatten().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in values.iter_mut().flatten() {
            *v /= max;
        }
    }
}

/// Touch visualization: `1 − potential` per cell.
///
/// Cells close to conductors sit near the grid potential, so the hand-to-foot
/// difference there is small.
pub fn touch_visualization(potential: &[Vec<f64>]) -> Vec<Vec<f64>> {
    potential
        .iter()
        .map(|row| row.iter().map(|v| 1.0 - v).collect())
        .collect()
}

/// Step visualization: normalized local gradient magnitude.
///
/// Uses forward differences to the right and lower neighbours; at the last
/// column/row the neighbour is the cell itself (zero difference). The result
/// is divided by the largest gradient unless that is 0.
pub fn step_visualization(potential: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = potential.len();
    let mut gradient: Vec<Vec<f64>> = potential
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cols = row.len();
            (0..cols)
                .map(|j| {
                    let here = row[j];
                    let right = row[(j + 1).min(cols - 1)];
                    let below = potential
                        .get((i + 1).min(rows - 1))
                        .and_then(|r| r.get(j))
                        .copied()
                        .unwrap_or(here);
                    let (dx, dy) = (right - here, below - here);
                    (dx * dx + dy * dy).sqrt()
                })
                .collect()
        })
        .collect();

    normalize_by_max(&mut gradient);
    gradient
}
