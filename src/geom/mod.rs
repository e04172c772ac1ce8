mod bbox;
mod geom;
mod proj;

use bbox::BoundingBox;
pub use geom::Geometries;
pub(crate) use proj::equal_area_crs;
