use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::geom::Geometries;
use crate::grid::GridSpec;

impl GridSpec {
    /// Produce one rectangular polygon per grid cell, row-major, each a
    /// closed counter-clockwise ring whose bounding box equals the cell's
    /// bounds. Pure transform; the grid is untouched.
    pub fn polygonize(&self) -> Vec<Polygon<f64>> {
        let mut polygons = Vec::with_capacity(self.n_cells());
        for &[south, north] in self.y_bounds() {
            for &[west, east] in self.x_bounds() {
                polygons.push(Polygon::new(
                    LineString(vec![
                        Coord { x: west, y: south },
                        Coord { x: east, y: south },
                        Coord { x: east, y: north },
                        Coord { x: west, y: north },
                        Coord { x: west, y: south },
                    ]),
                    vec![],
                ));
            }
        }
        polygons
    }

    /// Wrap the cell polygons in a spatially indexed [`Geometries`] tagged
    /// with the grid's native CRS.
    pub fn to_geometries(&self) -> Geometries {
        let shapes: Vec<MultiPolygon<f64>> = self.polygonize()
            .into_iter()
            .map(|polygon| MultiPolygon(vec![polygon]))
            .collect();
        Geometries::new(&shapes, Some(self.crs().to_string()))
    }
}
