pub mod feature;
pub mod geo;
pub mod geojson;
pub mod topojson;

pub use feature::*;
pub use geo::*;
