mod fs;
mod polygon;

pub(crate) use fs::{ensure_dir_exists, require_dir_exists};
pub(crate) use polygon::shp_to_geo;
