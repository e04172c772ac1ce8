mod polygonize;
mod spec;

pub use spec::GridSpec;
