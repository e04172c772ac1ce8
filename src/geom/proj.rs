use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj, transform::transform};

use crate::geom::Geometries;

impl Geometries {
    /// Reproject all shapes into the CRS given as a PROJ.4 string.
    ///
    /// Lon/lat input is converted degrees → radians before the transform
    /// (and back on lon/lat output), as proj4rs works in radians for
    /// geographic CRSs.
    pub fn reproject(&self, to_crs: &str) -> Result<Geometries> {
        let from = {
            let proj_string = self.crs();
            Proj::from_proj_string(proj_string)
                .with_context(|| anyhow!("failed to build source PROJ.4: {proj_string}"))?
        };

        let to = Proj::from_proj_string(to_crs)
            .with_context(|| anyhow!("failed to build target PROJ.4: {to_crs}"))?;

        let projected: Vec<_> = self.shapes().iter()
            .map(|shape| shape.map_coords(|coord: Coord<f64>| {
                let mut point = if from.is_latlong() {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.0)
                } else {
                    (coord.x, coord.y, 0.0)
                };
                transform(&from, &to, &mut point)
                    .expect("CRS transform failed");
                if to.is_latlong() {
                    Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
                } else {
                    Coord { x: point.0, y: point.1 }
                }
            }))
            .collect();

        Ok(Geometries::new(&projected, Some(to_crs.to_string())))
    }
}

/// Derive an Albers equal-area CRS from the lon/lat bounds of `geoms`,
/// with standard parallels at 1/6 and 5/6 of the latitude span.
///
/// Overlay areas are only meaningful in an equal-area projection, so this
/// is the default common CRS for the pipeline when none is supplied.
pub(crate) fn equal_area_crs(geoms: &Geometries) -> Result<String> {
    let source = Proj::from_proj_string(geoms.crs())
        .with_context(|| anyhow!("failed to build source PROJ.4: {}", geoms.crs()))?;
    if !source.is_latlong() {
        bail!("equal-area CRS derivation needs lon/lat geometries; pass a projected CRS explicitly");
    }

    let bounds = geoms.bounds()
        .ok_or_else(|| anyhow!("cannot derive a CRS from empty geometries"))?;

    let center = bounds.center();
    let span = bounds.max().y - bounds.min().y;
    let lat_1 = bounds.min().y + span / 6.0;
    let lat_2 = bounds.max().y - span / 6.0;

    Ok(format!(
        "+proj=aea +lat_1={lat_1} +lat_2={lat_2} +lat_0={} +lon_0={} +datum=WGS84 +units=m +no_defs +type=crs",
        center.y, center.x,
    ))
}
