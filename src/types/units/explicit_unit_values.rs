use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use uom::si::{
    f64::{Length, Power},
    length::{foot, kilometer, meter},
    power::{gigawatt, kilowatt, megawatt, watt},
};

/// A raw value tagged with the unit it was written in.
///
/// Catalog data arrives as plain numbers plus a unit string; these convert to
/// `uom` quantities at the boundary. Unit names are matched case-insensitively.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WithUnit<T> {
    pub value: f64,
    pub unit: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

pub type LengthValue = WithUnit<Length>;
pub type PowerValue = WithUnit<Power>;

impl<T> WithUnit<T> {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            _marker: PhantomData,
        }
    }

    fn normalized_unit(&self) -> String {
        self.unit.trim().to_ascii_lowercase()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("Unknown length unit: {0}")]
    UnknownLengthUnit(String),

    #[error("Unknown power unit: {0}")]
    UnknownPowerUnit(String),
}

impl WithUnit<Length> {
    pub fn to_length(&self) -> Result<Length, UnitError> {
        match self.normalized_unit().as_str() {
            "m" | "meter" | "metre" | "meters" | "metres" => Ok(Length::new::<meter>(self.value)),
            "km" | "kilometer" | "kilometre" | "kilometers" | "kilometres" => {
                Ok(Length::new::<kilometer>(self.value))
            }
            "ft" | "foot" | "feet" => Ok(Length::new::<foot>(self.value)),
            _ => Err(UnitError::UnknownLengthUnit(self.unit.clone())),
        }
    }
}

impl WithUnit<Power> {
    pub fn to_power(&self) -> Result<Power, UnitError> {
        let power = match self.normalized_unit().as_str() {
            "w" | "watt" | "watts" => Power::new::<watt>(self.value),
            "kw" | "kilowatt" | "kilowatts" => Power::new::<kilowatt>(self.value),
            "mw" | "megawatt" | "megawatts" => Power::new::<megawatt>(self.value),
            "gw" | "gigawatt" | "gigawatts" => Power::new::<gigawatt>(self.value),
            _ => return Err(UnitError::UnknownPowerUnit(self.unit.clone())),
        };
        Ok(power)
    }

    /// Factor that converts a value in this unit to watts
    pub fn watts_per_unit(unit: &str) -> Result<f64, UnitError> {
        Ok(WithUnit::<Power>::new(1.0, unit).to_power()?.get::<watt>())
    }
}
