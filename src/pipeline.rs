use anyhow::{bail, Result};
use ndarray::ArrayView3;

use crate::geom::equal_area_crs;
use crate::grid::GridSpec;
use crate::overlay::overlay;
use crate::regrid::{regrid, RegriddedSeries};
use crate::region::RegionSet;
use crate::weights::{build_weights, WeightMatrix};

/// End-to-end weight construction: polygonize the grid, bring both sides
/// into one equal-area CRS, overlay, normalize.
///
/// When `target_crs` is `None`, an Albers CRS is derived from the regions'
/// lon/lat bounds; pass an explicit PROJ.4 string to override (required
/// when the regions are already projected).
pub fn build_weights_for(
    grid: &GridSpec,
    regions: &RegionSet,
    target_crs: Option<&str>,
    verbose: u8,
) -> Result<WeightMatrix> {
    if regions.is_empty() {
        bail!("no regions to build weights for");
    }

    let target = match target_crs {
        Some(crs) => crs.to_string(),
        None => equal_area_crs(regions.geoms())?,
    };

    if verbose > 0 { eprintln!("[build_weights] polygonizing {}x{} grid", grid.nrows(), grid.ncols()); }
    let cells = grid.to_geometries();

    if verbose > 0 { eprintln!("[build_weights] reprojecting {} cells", cells.len()); }
    let cells = cells.reproject(&target)?;

    if verbose > 0 { eprintln!("[build_weights] reprojecting {} regions", regions.len()); }
    let region_geoms = regions.geoms().reproject(&target)?;

    if verbose > 0 { eprintln!("[build_weights] overlaying cells against regions"); }
    let fragments = overlay(&cells, &region_geoms)?;

    if verbose > 0 { eprintln!("[build_weights] normalizing {} fragments", fragments.len()); }
    build_weights(&fragments, grid.n_cells(), regions.len())
}

/// Run the whole pipeline for one variable: build weights for the grid and
/// regions, then apply them across the time axis of `data`.
pub fn regrid_dataset(
    data: ArrayView3<'_, f64>,
    grid: &GridSpec,
    regions: &RegionSet,
    target_crs: Option<&str>,
    verbose: u8,
) -> Result<RegriddedSeries> {
    let weights = build_weights_for(grid, regions, target_crs, verbose)?;

    if verbose > 0 { eprintln!("[regrid] applying weights across {} time steps", data.dim().0); }
    let values = regrid(data, &weights)?;

    RegriddedSeries::new(values, regions.names().to_vec())
}
