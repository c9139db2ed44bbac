pub mod weibull;
pub mod wind_resource;

pub use weibull::*;
pub use wind_resource::*;
