use anyhow::{bail, Result};
use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use rayon::prelude::*;
use rstar::AABB;

use crate::geom::Geometries;

/// The intersection of one grid cell and one region: the clipped geometry,
/// its area, and the ids of both parents.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub cell: u32,
    pub region: u32,
    pub geometry: MultiPolygon<f64>,
    pub area: f64,
}

/// Intersect every grid cell against every region that spatially overlaps
/// it, returning all fragments with positive area.
///
/// Both collections must already share one projected CRS; a mismatch is a
/// correctness bug in the caller and fails immediately. Zero-area results
/// (cells merely touching a region boundary) are discarded. A region with
/// no grid coverage simply contributes no fragments.
///
/// Regions are processed in parallel; output is ordered by (region, cell),
/// so repeated runs produce identical fragment lists.
pub fn overlay(cells: &Geometries, regions: &Geometries) -> Result<Vec<Fragment>> {
    if cells.crs() != regions.crs() {
        bail!("CRS mismatch: cells are {:?} but regions are {:?}", cells.crs(), regions.crs());
    }
    if cells.len() > u32::MAX as usize || regions.len() > u32::MAX as usize {
        bail!("overlay supports at most {} cells or regions", u32::MAX);
    }

    let per_region: Vec<Vec<Fragment>> = regions.shapes().par_iter().enumerate()
        .map(|(r, region)| {
            let Some(rect) = region.bounding_rect() else { return Vec::new() };
            let search = AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            );

            let mut candidates: Vec<usize> = cells.query(&search).collect();
            candidates.sort_unstable();

            let mut fragments = Vec::new();
            for i in candidates {
                let piece = cells.shapes()[i].intersection(region);
                let area = piece.unsigned_area();
                if area > 0.0 {
                    fragments.push(Fragment {
                        cell: i as u32,
                        region: r as u32,
                        geometry: piece,
                        area,
                    });
                }
            }
            fragments
        })
        .collect();

    Ok(per_region.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]])
    }

    fn unit_cells(nx: usize, ny: usize) -> Geometries {
        let mut shapes = Vec::new();
        for row in 0..ny {
            for col in 0..nx {
                shapes.push(rect(col as f64, row as f64, col as f64 + 1.0, row as f64 + 1.0));
            }
        }
        Geometries::new(&shapes, Some("+proj=utm +zone=13".into()))
    }

    #[test]
    fn fragments_partition_a_covered_region() {
        let cells = unit_cells(2, 2);
        // One region covering the left column of the 2x2 grid.
        let regions = Geometries::new(&[rect(0.0, 0.0, 1.0, 2.0)], Some("+proj=utm +zone=13".into()));

        let fragments = overlay(&cells, &regions).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments.iter().map(|f| f.cell).collect::<Vec<_>>(), vec![0, 2]);
        let total: f64 = fragments.iter().map(|f| f.area).sum();
        assert!((total - 2.0).abs() < 1e-9);
    }

    #[test]
    fn partial_coverage_keeps_partial_areas() {
        let cells = unit_cells(2, 1);
        // Region straddles both cells, half a unit tall.
        let regions = Geometries::new(&[rect(0.5, 0.0, 1.5, 0.5)], Some("+proj=utm +zone=13".into()));

        let fragments = overlay(&cells, &regions).unwrap();
        assert_eq!(fragments.len(), 2);
        for fragment in &fragments {
            assert!((fragment.area - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn touching_cells_produce_no_fragments() {
        let cells = unit_cells(1, 1);
        // Region shares an edge with the cell but has no interior overlap.
        let regions = Geometries::new(&[rect(1.0, 0.0, 2.0, 1.0)], Some("+proj=utm +zone=13".into()));

        let fragments = overlay(&cells, &regions).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn disjoint_region_yields_nothing() {
        let cells = unit_cells(2, 2);
        let regions = Geometries::new(&[rect(10.0, 10.0, 12.0, 12.0)], Some("+proj=utm +zone=13".into()));

        assert!(overlay(&cells, &regions).unwrap().is_empty());
    }

    #[test]
    fn crs_mismatch_is_an_error() {
        let cells = unit_cells(1, 1);
        let regions = Geometries::new(&[rect(0.0, 0.0, 1.0, 1.0)], Some("+proj=utm +zone=14".into()));

        let err = overlay(&cells, &regions).unwrap_err();
        assert!(err.to_string().contains("CRS mismatch"));
    }
}
