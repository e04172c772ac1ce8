mod series;

use anyhow::{bail, Result};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView3, Axis};

use crate::weights::WeightMatrix;

pub use series::RegriddedSeries;

/// Apply a weight matrix to every time slice of a `(time, row, col)`
/// variable, producing a `(time, region)` array.
///
/// Each output value is the area-weighted mean of the contributing cells
/// (weights sum to 1 per covered region); uncovered regions come out 0.0
/// at every step. The data must be on the exact grid the weights were
/// built from: a flattened-plane size mismatch fails immediately.
///
/// Time steps are independent and processed in parallel against the
/// read-only matrix.
pub fn regrid(data: ArrayView3<'_, f64>, weights: &WeightMatrix) -> Result<Array2<f64>> {
    let (nt, nrows, ncols) = data.dim();
    if nrows * ncols != weights.n_cells() {
        bail!("grid mismatch: data planes are {nrows}x{ncols} = {} cells, weight matrix expects {}",
            nrows * ncols, weights.n_cells());
    }

    let mut out = Array2::<f64>::zeros((nt, weights.n_regions()));
    out.axis_iter_mut(Axis(0)).into_par_iter()
        .zip(data.axis_iter(Axis(0)).into_par_iter())
        .for_each(|(mut row, plane)| weights.accumulate_plane(&plane, &mut row));

    Ok(out)
}
