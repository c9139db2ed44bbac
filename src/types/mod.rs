pub mod units;
pub mod conversion;

pub use units::*;
pub use conversion::*;

// Domain aliases over uom quantities
pub type WindSpeed = Velocity;
pub type WindDirection = Angle;
pub type RotorDiameter = Length;
pub type HubHeight = Length;
pub type TurbinePower = Power;
pub type AnnualEnergy = Energy;

pub use nalgebra as na;
