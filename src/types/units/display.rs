//! Human readable wrappers for quantities in messages and summaries

use std::fmt;

use crate::types::units::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLength(pub Length);
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayVelocity(pub Velocity);
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPower(pub Power);
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayEnergy(pub Energy);

impl fmt::Display for DisplayLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meters = self.0.get::<meter>();
        if meters.abs() >= 10_000.0 {
            write!(f, "{:.2}km", self.0.get::<kilometer>())
        } else {
            write!(f, "{meters:.1}m")
        }
    }
}

impl fmt::Display for DisplayVelocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m/s", self.0.get::<meter_per_second>())
    }
}

impl fmt::Display for DisplayPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let megawatts = self.0.get::<megawatt>();
        match megawatts.abs() {
            m if m >= 1.0 => write!(f, "{megawatts:.2}MW"),
            _ => write!(f, "{:.1}kW", self.0.get::<kilowatt>()),
        }
    }
}

/// Energy in GWh with the MWh figure alongside
impl fmt::Display for DisplayEnergy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}GWh ({:.0}MWh)",
            self.0.get::<gigawatt_hour>(),
            self.0.get::<megawatt_hour>()
        )
    }
}
