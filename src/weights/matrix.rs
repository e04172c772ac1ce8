use anyhow::{bail, Result};
use ndarray::{ArrayView2, ArrayViewMut1};

/// A sparse cells × regions weight matrix in compressed column format.
///
/// Column `r`'s entries live at `offsets[r]..offsets[r + 1]` in the flat
/// `cells` / `weights` vectors, sorted by cell id. Absent (cell, region)
/// pairs are implicit zeros, and a dense cells × regions matrix is never
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    n_cells: usize,
    offsets: Vec<u64>, // len = n_regions + 1
    cells: Vec<u32>,   // len = nnz, flat cell ids grouped by region
    weights: Vec<f64>, // len = nnz
}

impl WeightMatrix {
    /// Construct a matrix from (cell, region, weight) triples.
    ///
    /// Entries are grouped by region and sorted by cell id; a duplicate
    /// (cell, region) pair is a caller bug and fails construction.
    pub fn from_triplets(n_cells: usize, n_regions: usize, triplets: &[(u32, u32, f64)]) -> Result<Self> {
        for &(cell, region, weight) in triplets {
            if cell as usize >= n_cells {
                bail!("cell id {cell} out of range for {n_cells} cells");
            }
            if region as usize >= n_regions {
                bail!("region id {region} out of range for {n_regions} regions");
            }
            if !weight.is_finite() {
                bail!("weight for (cell {cell}, region {region}) is not finite: {weight}");
            }
        }

        // Offsets are cumulative per-region entry counts.
        let mut counts = vec![0_u64; n_regions];
        for &(_, region, _) in triplets {
            counts[region as usize] += 1;
        }
        let offsets: Vec<u64> = std::iter::once(0_u64).chain(
            counts.iter().scan(0_u64, |acc, &count| { *acc += count; Some(*acc) })
        ).collect();

        // Scatter into place, then order each column by cell id.
        let nnz = *offsets.last().unwrap() as usize;
        let mut cells = vec![0_u32; nnz];
        let mut weights = vec![0.0_f64; nnz];
        let mut cursor: Vec<u64> = offsets[..n_regions].to_vec();
        for &(cell, region, weight) in triplets {
            let at = cursor[region as usize] as usize;
            cells[at] = cell;
            weights[at] = weight;
            cursor[region as usize] += 1;
        }

        for region in 0..n_regions {
            let range = offsets[region] as usize..offsets[region + 1] as usize;
            let mut column: Vec<(u32, f64)> = cells[range.clone()].iter().copied()
                .zip(weights[range.clone()].iter().copied())
                .collect();
            column.sort_unstable_by_key(|&(cell, _)| cell);

            for pair in column.windows(2) {
                if pair[0].0 == pair[1].0 {
                    bail!("duplicate entry for (cell {}, region {region})", pair[0].0);
                }
            }
            for (slot, (cell, weight)) in range.zip(column) {
                cells[slot] = cell;
                weights[slot] = weight;
            }
        }

        Ok(Self { n_cells, offsets, cells, weights })
    }

    /// Get the number of grid cells (rows).
    #[inline] pub fn n_cells(&self) -> usize { self.n_cells }

    /// Get the number of regions (columns).
    #[inline] pub fn n_regions(&self) -> usize { self.offsets.len() - 1 }

    /// Get the number of stored (nonzero) entries.
    #[inline] pub fn nnz(&self) -> usize { self.cells.len() }

    #[inline]
    fn range(&self, region: usize) -> std::ops::Range<usize> {
        self.offsets[region] as usize..self.offsets[region + 1] as usize
    }

    /// Iterate a region's (cell id, weight) entries in cell order.
    #[inline]
    pub fn column(&self, region: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.range(region).map(move |at| (self.cells[at], self.weights[at]))
    }

    /// Sum each region's stored weights (1.0 for covered regions, 0.0 for
    /// uncovered ones).
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.n_regions())
            .map(|region| self.column(region).map(|(_, weight)| weight).sum())
            .collect()
    }

    /// Accumulate one (row, col) data plane into a per-region output row.
    ///
    /// Flat cell ids map into the plane as `(cell / ncols, cell % ncols)`,
    /// so non-contiguous views work without reshaping or copying.
    pub(crate) fn accumulate_plane(&self, plane: &ArrayView2<f64>, out: &mut ArrayViewMut1<f64>) {
        debug_assert_eq!(plane.len(), self.n_cells);
        debug_assert_eq!(out.len(), self.n_regions());

        let ncols = plane.ncols();
        for region in 0..self.n_regions() {
            out[region] = self.column(region)
                .map(|(cell, weight)| {
                    let cell = cell as usize;
                    weight * plane[[cell / ncols, cell % ncols]]
                })
                .sum();
        }
    }

    /// Access the raw parts (offsets, cells, weights) for serialization.
    pub(crate) fn raw_parts(&self) -> (&[u64], &[u32], &[f64]) {
        (&self.offsets, &self.cells, &self.weights)
    }

    /// Reassemble a matrix from raw compressed-column parts.
    pub(crate) fn from_raw_parts(
        n_cells: usize,
        offsets: Vec<u64>,
        cells: Vec<u32>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if offsets.first() != Some(&0) {
            bail!("offsets must start at 0");
        }
        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            bail!("offsets must be non-decreasing");
        }
        let nnz = *offsets.last().unwrap() as usize;
        if cells.len() != nnz || weights.len() != nnz {
            bail!("nnz mismatch: offsets say {nnz}, got {} cells and {} weights",
                cells.len(), weights.len());
        }
        if let Some(&cell) = cells.iter().max() {
            if cell as usize >= n_cells {
                bail!("cell id {cell} out of range for {n_cells} cells");
            }
        }
        Ok(Self { n_cells, offsets, cells, weights })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn make_test_matrix() -> WeightMatrix {
        // 4 cells (2x2 grid), 2 regions: region 0 = left column, region 1 =
        // right column, equal split.
        WeightMatrix::from_triplets(4, 2, &[
            (0, 0, 0.5),
            (2, 0, 0.5),
            (1, 1, 0.5),
            (3, 1, 0.5),
        ]).unwrap()
    }

    #[test]
    fn compressed_column_construction() {
        let matrix = make_test_matrix();

        // Basic counts
        assert_eq!(matrix.n_cells(), 4);
        assert_eq!(matrix.n_regions(), 2);
        assert_eq!(matrix.nnz(), 4);

        // Offsets are cumulative entry counts, len = regions + 1
        assert_eq!(matrix.offsets, vec![0, 2, 4]);

        // Entries are grouped by region, sorted by cell id
        assert_eq!(matrix.cells, vec![0, 2, 1, 3]);
        assert_eq!(matrix.weights, vec![0.5, 0.5, 0.5, 0.5]);

        // Invariant: last offset == total stored entries
        assert_eq!(*matrix.offsets.last().unwrap() as usize, matrix.nnz());
    }

    #[test]
    fn columns_sort_by_cell_regardless_of_input_order() {
        let shuffled = WeightMatrix::from_triplets(4, 2, &[
            (3, 1, 0.5),
            (2, 0, 0.5),
            (1, 1, 0.5),
            (0, 0, 0.5),
        ]).unwrap();
        assert_eq!(shuffled, make_test_matrix());
    }

    #[test]
    fn empty_columns_are_valid() {
        let matrix = WeightMatrix::from_triplets(4, 3, &[(0, 1, 1.0)]).unwrap();
        assert_eq!(matrix.column(0).count(), 0);
        assert_eq!(matrix.column(1).collect::<Vec<_>>(), vec![(0, 1.0)]);
        assert_eq!(matrix.column(2).count(), 0);
        assert_eq!(matrix.column_sums(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn duplicate_pairs_are_an_error() {
        let err = WeightMatrix::from_triplets(4, 1, &[(2, 0, 0.5), (2, 0, 0.5)]).unwrap_err();
        assert!(err.to_string().contains("duplicate entry"));
    }

    #[test]
    fn out_of_range_triplets_are_an_error() {
        assert!(WeightMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]).is_err());
        assert!(WeightMatrix::from_triplets(2, 2, &[(0, 2, 1.0)]).is_err());
        assert!(WeightMatrix::from_triplets(2, 2, &[(0, 0, f64::NAN)]).is_err());
    }

    #[test]
    fn accumulate_plane_weighted_sums() {
        let matrix = make_test_matrix();
        let plane = array![[1.0, 2.0], [3.0, 4.0]];
        let mut out = Array1::<f64>::zeros(2);

        matrix.accumulate_plane(&plane.view(), &mut out.view_mut());
        // Region 0: cells 0 and 2 -> (1 + 3) / 2; region 1: cells 1 and 3.
        assert_eq!(out, array![2.0, 3.0]);
    }

    #[test]
    fn raw_parts_round_trip() {
        let matrix = make_test_matrix();
        let (offsets, cells, weights) = matrix.raw_parts();
        let rebuilt = WeightMatrix::from_raw_parts(
            matrix.n_cells(),
            offsets.to_vec(),
            cells.to_vec(),
            weights.to_vec(),
        ).unwrap();
        assert_eq!(rebuilt, matrix);
    }

    #[test]
    fn malformed_raw_parts_are_an_error() {
        assert!(WeightMatrix::from_raw_parts(4, vec![1, 2], vec![0], vec![1.0]).is_err());
        assert!(WeightMatrix::from_raw_parts(4, vec![0, 2], vec![0], vec![1.0]).is_err());
        assert!(WeightMatrix::from_raw_parts(1, vec![0, 1], vec![3], vec![1.0]).is_err());
    }
}
