use shapefile as shp;

/// Ensure the first and last coordinates of a ring coincide.
fn close_ring(coords: &mut Vec<geo::Coord<f64>>) {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
}

/// Signed area of a coordinate ring (negative for clockwise winding).
fn ring_signed_area(coords: &[geo::Coord<f64>]) -> f64 {
    let mut acc = 0.0;
    for pair in coords.windows(2) {
        acc += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    acc / 2.0
}

/// Convert a shapefile::Polygon into a geo::MultiPolygon<f64>.
///
/// Shapefiles store rings in a flat list, outer rings clockwise and each
/// outer ring followed by its (counter-clockwise) holes. Group them back
/// into polygons, inferring ring role from winding order.
pub(crate) fn shp_to_geo(polygon: &shp::Polygon) -> geo::MultiPolygon<f64> {
    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut exterior: Option<geo::LineString<f64>> = None;
    let mut holes: Vec<geo::LineString<f64>> = Vec::new();

    for ring in polygon.rings() {
        let mut coords: Vec<geo::Coord<f64>> = ring.points().iter()
            .map(|pt| geo::Coord { x: pt.x, y: pt.y })
            .collect();
        close_ring(&mut coords);

        // CW => exterior under the Shapefile convention.
        let is_exterior = ring_signed_area(&coords) < 0.0;
        let ls = geo::LineString(coords);

        if is_exterior {
            if let Some(ext) = exterior.take() {
                polys.push(geo::Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(ls);
        } else {
            holes.push(ls);
        }
    }
    if let Some(ext) = exterior {
        polys.push(geo::Polygon::new(ext, holes));
    }

    geo::MultiPolygon(polys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square_ring(x0: f64, y0: f64, size: f64, clockwise: bool) -> Vec<shp::Point> {
        let mut pts = vec![
            shp::Point { x: x0, y: y0 },
            shp::Point { x: x0, y: y0 + size },
            shp::Point { x: x0 + size, y: y0 + size },
            shp::Point { x: x0 + size, y: y0 },
            shp::Point { x: x0, y: y0 },
        ];
        if !clockwise {
            pts.reverse();
        }
        pts
    }

    #[test]
    fn single_outer_ring_converts() {
        let shp_poly = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square_ring(0.0, 0.0, 2.0, true)),
        ]);
        let mp = shp_to_geo(&shp_poly);
        assert_eq!(mp.0.len(), 1);
        assert!((mp.unsigned_area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn outer_ring_with_hole_groups_correctly() {
        let shp_poly = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square_ring(0.0, 0.0, 4.0, true)),
            shp::PolygonRing::Inner(square_ring(1.0, 1.0, 1.0, false)),
        ]);
        let mp = shp_to_geo(&shp_poly);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!((mp.unsigned_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn two_outer_rings_yield_two_polygons() {
        let shp_poly = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square_ring(0.0, 0.0, 1.0, true)),
            shp::PolygonRing::Outer(square_ring(5.0, 5.0, 1.0, true)),
        ]);
        let mp = shp_to_geo(&shp_poly);
        assert_eq!(mp.0.len(), 2);
    }
}
