#![doc = "Zonal public API"]
mod common;
mod geom;
mod grid;
mod overlay;
mod pipeline;
mod regrid;
mod region;
mod weights;

#[doc(inline)]
pub use geom::Geometries;

#[doc(inline)]
pub use grid::GridSpec;

#[doc(inline)]
pub use region::RegionSet;

#[doc(inline)]
pub use overlay::{overlay, Fragment};

#[doc(inline)]
pub use weights::{build_weights, WeightMatrix, WeightsManifest};

#[doc(inline)]
pub use regrid::{regrid, RegriddedSeries};

#[doc(inline)]
pub use pipeline::{build_weights_for, regrid_dataset};
