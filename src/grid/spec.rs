use anyhow::{bail, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Definition of a rectilinear grid: per-axis cell bounds in the grid's
/// native map projection.
///
/// Cells are addressed row-major with row = y axis, col = x axis, matching
/// the `(time, y, x)` layout of the data arrays this crate consumes. The
/// flattened id of cell `(row, col)` is `row * ncols + col`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    x_bounds: Vec<[f64; 2]>, // per-column (west, east), ascending
    y_bounds: Vec<[f64; 2]>, // per-row (south, north), ascending
    crs: String,             // native projection, PROJ.4
}

/// Validate one axis of cell bounds: finite, non-degenerate, ascending.
fn validate_axis(axis: &str, bounds: &[[f64; 2]]) -> Result<()> {
    if bounds.is_empty() {
        bail!("{axis} axis has no cells");
    }
    for (i, [lower, upper]) in bounds.iter().enumerate() {
        if !lower.is_finite() || !upper.is_finite() {
            bail!("{axis} bounds[{i}] are not finite: [{lower}, {upper}]");
        }
        if lower >= upper {
            bail!("{axis} bounds[{i}] are degenerate: lower {lower} >= upper {upper}");
        }
    }
    for (i, pair) in bounds.windows(2).enumerate() {
        if pair[1][0] <= pair[0][0] || pair[1][1] <= pair[0][1] {
            bail!("{axis} bounds are not monotonically ascending at index {}", i + 1);
        }
    }
    Ok(())
}

impl GridSpec {
    /// Construct a grid from per-axis bounds arrays of shape `(n, 2)`,
    /// holding (lower, upper) per cell.
    pub fn new<'a>(x_bounds: ArrayView2<'a, f64>, y_bounds: ArrayView2<'a, f64>, crs: &str) -> Result<Self> {
        for (axis, bounds) in [("x", &x_bounds), ("y", &y_bounds)] {
            if bounds.ncols() != 2 {
                bail!("{axis} bounds must have exactly 2 bounds per cell, got {}", bounds.ncols());
            }
        }

        let collect = |bounds: &ArrayView2<f64>| -> Vec<[f64; 2]> {
            bounds.rows().into_iter().map(|row| [row[0], row[1]]).collect()
        };

        let spec = Self {
            x_bounds: collect(&x_bounds),
            y_bounds: collect(&y_bounds),
            crs: crs.to_string(),
        };
        validate_axis("x", &spec.x_bounds)?;
        validate_axis("y", &spec.y_bounds)?;
        Ok(spec)
    }

    /// Construct a grid from per-axis cell edge coordinates (`n + 1` edges
    /// describe `n` cells).
    pub fn from_cell_edges(x_edges: &[f64], y_edges: &[f64], crs: &str) -> Result<Self> {
        let intervals = |axis: &str, edges: &[f64]| -> Result<Vec<[f64; 2]>> {
            if edges.len() < 2 {
                bail!("{axis} axis needs at least 2 edges, got {}", edges.len());
            }
            Ok(edges.windows(2).map(|pair| [pair[0], pair[1]]).collect())
        };

        let spec = Self {
            x_bounds: intervals("x", x_edges)?,
            y_bounds: intervals("y", y_edges)?,
            crs: crs.to_string(),
        };
        validate_axis("x", &spec.x_bounds)?;
        validate_axis("y", &spec.y_bounds)?;
        Ok(spec)
    }

    /// Get the number of columns (x axis cells).
    #[inline] pub fn ncols(&self) -> usize { self.x_bounds.len() }

    /// Get the number of rows (y axis cells).
    #[inline] pub fn nrows(&self) -> usize { self.y_bounds.len() }

    /// Get the total number of grid cells.
    #[inline] pub fn n_cells(&self) -> usize { self.nrows() * self.ncols() }

    /// Get the grid's native projection as a PROJ.4 string.
    #[inline] pub fn crs(&self) -> &str { &self.crs }

    /// Get the per-column (west, east) bounds.
    #[inline] pub fn x_bounds(&self) -> &[[f64; 2]] { &self.x_bounds }

    /// Get the per-row (south, north) bounds.
    #[inline] pub fn y_bounds(&self) -> &[[f64; 2]] { &self.y_bounds }

    /// Cell center coordinates along each axis (x per column, y per row).
    pub fn cell_centers(&self) -> (Vec<f64>, Vec<f64>) {
        let mid = |bounds: &[[f64; 2]]| bounds.iter().map(|[lo, hi]| 0.5 * (lo + hi)).collect();
        (mid(&self.x_bounds), mid(&self.y_bounds))
    }
}
