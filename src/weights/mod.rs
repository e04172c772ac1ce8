mod io;
mod matrix;

use anyhow::{bail, Result};

use crate::overlay::Fragment;

pub use io::WeightsManifest;
pub use matrix::WeightMatrix;

/// Convert overlay fragments into a normalized sparse weight matrix.
///
/// weight(cell, region) = fragment area / total fragment area of that
/// region, so every region with any grid coverage gets a column summing to
/// 1.0 and the downstream matrix product is an area-weighted mean. Regions
/// with no coverage keep an empty (all-zero) column; that is not an error.
pub fn build_weights(fragments: &[Fragment], n_cells: usize, n_regions: usize) -> Result<WeightMatrix> {
    let mut totals = vec![0.0_f64; n_regions];
    for fragment in fragments {
        if fragment.cell as usize >= n_cells {
            bail!("fragment cell id {} out of range for {} cells", fragment.cell, n_cells);
        }
        if fragment.region as usize >= n_regions {
            bail!("fragment region id {} out of range for {} regions", fragment.region, n_regions);
        }
        if !(fragment.area > 0.0) {
            bail!("fragment (cell {}, region {}) has non-positive area {}",
                fragment.cell, fragment.region, fragment.area);
        }
        totals[fragment.region as usize] += fragment.area;
    }

    let triplets: Vec<(u32, u32, f64)> = fragments.iter()
        .map(|f| (f.cell, f.region, f.area / totals[f.region as usize]))
        .collect();

    WeightMatrix::from_triplets(n_cells, n_regions, &triplets)
}
