use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::MultiPolygon;
use shapefile::{dbase::FieldValue, Reader, Shape};

use crate::common::shp_to_geo;
use crate::region::RegionSet;

impl RegionSet {
    /// Load regions from a shapefile, taking region names from the given
    /// attribute field. The shapefile format carries no usable CRS, so the
    /// caller supplies one (defaults to WGS84 lon/lat when `None`).
    pub fn read_shapefile(path: &Path, name_field: &str, crs: Option<&str>) -> Result<Self> {
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

        let mut names = Vec::with_capacity(reader.shape_count()?);
        let mut polygons: Vec<MultiPolygon<f64>> = Vec::with_capacity(names.capacity());

        for (i, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result.context("Error reading shape+record")?;

            let polygon = match shape {
                Shape::Polygon(p) => shp_to_geo(&p),
                other => bail!("record {i}: expected Polygon geometry, got {}", other.shapetype()),
            };

            let name = match record.get(name_field) {
                Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
                Some(FieldValue::Numeric(Some(n))) => n.to_string(),
                Some(_) => bail!("record {i}: field {name_field:?} is empty or non-text"),
                None => bail!("record {i}: no field {name_field:?} in attribute table"),
            };

            names.push(name);
            polygons.push(polygon);
        }

        Self::new(names, polygons, crs.map(str::to_string))
    }
}
