pub mod endpoint;
pub mod error;
pub mod generation;
pub mod join;

pub use endpoint::*;
pub use error::*;
pub use generation::*;
pub use join::*;
