pub mod geometry;
pub mod deficit;
pub mod superposition;

pub use geometry::*;
pub use deficit::*;
pub use superposition::*;
