mod io;

use ahash::AHashMap;
use anyhow::{bail, Result};
use geo::MultiPolygon;

use crate::geom::Geometries;

/// A set of named target regions sharing one CRS.
///
/// Region names label the output columns downstream, so they must be
/// unique. Immutable once built.
#[derive(Debug, Clone)]
pub struct RegionSet {
    names: Vec<String>,
    index: AHashMap<String, u32>, // Map between names and contiguous indices.
    geoms: Geometries,
}

impl RegionSet {
    /// Construct a RegionSet from parallel name and polygon vectors.
    pub fn new(names: Vec<String>, polygons: Vec<MultiPolygon<f64>>, crs: Option<String>) -> Result<Self> {
        if names.len() != polygons.len() {
            bail!("got {} region names for {} polygons", names.len(), polygons.len());
        }

        let mut index = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i as u32).is_some() {
                bail!("duplicate region name: {name:?}");
            }
        }

        Ok(Self {
            index,
            geoms: Geometries::new(&polygons, crs),
            names,
        })
    }

    /// Get the number of regions.
    #[inline] pub fn len(&self) -> usize { self.names.len() }

    /// Check if there are no regions.
    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Get the region names, in index order.
    #[inline] pub fn names(&self) -> &[String] { &self.names }

    /// Get the region geometries.
    #[inline] pub fn geoms(&self) -> &Geometries { &self.geoms }

    /// Look up a region index by name.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|&i| i as usize)
    }
}
