use geo::{Area, BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{RTree, AABB};

use crate::geom::BoundingBox;

/// Geographic lon/lat on WGS84, assumed when no CRS is supplied.
pub(crate) const DEFAULT_CRS: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// A collection of MultiPolygons with a spatial index and a common CRS.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    crs: Option<String>, // PROJ.4 string, if known
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    pub fn new(polygons: &[MultiPolygon<f64>], crs: Option<String>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                polygons.iter().enumerate()
                    .filter_map(|(i, polygon)| polygon.bounding_rect()
                        .map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes: polygons.to_vec(),
            crs,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub fn shapes(&self) -> &Vec<MultiPolygon<f64>> { &self.shapes }

    /// Get the CRS, or default to WGS84 lon/lat if unknown.
    #[inline] pub fn crs(&self) -> &str { self.crs.as_deref().unwrap_or(DEFAULT_CRS) }

    /// Query the R-tree for the indices of shapes whose bounding boxes
    /// intersect the given envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> {
        self.rtree.locate_in_envelope_intersecting(envelope).map(|bb| bb.idx())
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    #[inline]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|polygon| polygon.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Compute the unsigned area of each MultiPolygon.
    #[inline]
    pub fn areas(&self) -> Vec<f64> {
        self.shapes.iter().map(|polygon| polygon.unsigned_area()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square(x0: f64, y0: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
        ]])
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let geoms = Geometries::new(&[unit_square(0.0, 0.0), unit_square(3.0, 5.0)], None);
        let bounds = geoms.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 4.0, y: 6.0 });
    }

    #[test]
    fn query_returns_only_overlapping_candidates() {
        let geoms = Geometries::new(&[unit_square(0.0, 0.0), unit_square(10.0, 10.0)], None);
        let hits: Vec<usize> = geoms.query(&AABB::from_corners([0.5, 0.5], [1.5, 1.5])).collect();
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn default_crs_is_lonlat() {
        let geoms = Geometries::new(&[unit_square(0.0, 0.0)], None);
        assert!(geoms.crs().contains("+proj=longlat"));

        let tagged = Geometries::new(&[unit_square(0.0, 0.0)], Some("+proj=utm +zone=13".into()));
        assert_eq!(tagged.crs(), "+proj=utm +zone=13");
    }

    #[test]
    fn areas_match_known_values() {
        let geoms = Geometries::new(&[unit_square(0.0, 0.0), unit_square(2.0, 2.0)], None);
        assert_eq!(geoms.areas(), vec![1.0, 1.0]);
    }
}
