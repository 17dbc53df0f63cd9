pub mod aggregates;
pub mod geometry;
pub mod infrastructure;
pub mod legend;
pub mod markers;
pub mod popup;
pub mod symbology;
pub mod visibility;

pub use aggregates::*;
pub use infrastructure::*;
pub use legend::*;
pub use markers::*;
pub use symbology::*;
pub use visibility::*;
