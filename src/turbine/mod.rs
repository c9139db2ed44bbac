pub mod power_curve;
pub mod catalog;

pub use power_curve::*;
pub use catalog::*;
