mod display;
mod explicit_unit_values;

pub use uom::si::f64::{Angle, Energy, Length, Power, Time, Velocity};

pub use uom::si::{
    angle::{degree, radian},
    energy::{gigawatt_hour, megawatt_hour, watt_hour},
    length::{kilometer, meter},
    power::{kilowatt, megawatt, watt},
    time::hour,
    velocity::meter_per_second,
};

pub use display::{DisplayEnergy, DisplayLength, DisplayPower, DisplayVelocity};
pub use explicit_unit_values::{LengthValue, PowerValue, UnitError, WithUnit};
