//! Tabulated power and thrust-coefficient response of a turbine model
//!
//! Speeds are stored in m/s and power in W. Outside the tabulated speed range
//! the turbine is parked: zero power and zero thrust.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Interpolation between tabulated samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Piecewise linear (fast, kinked derivative)
    #[default]
    Linear,
    /// Shape-preserving monotone cubic (Fritsch-Carlson / PCHIP)
    Pchip,
}

/// A single row of a power/thrust table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    /// m/s
    pub wind_speed: f64,
    /// W
    pub power: f64,
    pub thrust_coefficient: f64,
}

impl CurveSample {
    pub fn new(wind_speed: f64, power: f64, thrust_coefficient: f64) -> Self {
        Self {
            wind_speed,
            power,
            thrust_coefficient,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("Power/thrust table needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("Wind speeds must be strictly increasing: {previous} m/s followed by {next} m/s")]
    NonIncreasingSpeed { previous: f64, next: f64 },

    #[error("Invalid {quantity} {value} at {wind_speed} m/s")]
    InvalidValue {
        quantity: &'static str,
        value: f64,
        wind_speed: f64,
    },

    #[error("Column length mismatch: {speeds} speeds, {power} power values, {thrust} thrust coefficients")]
    ColumnMismatch {
        speeds: usize,
        power: usize,
        thrust: usize,
    },

    #[error("Unit conversion error: {0}")]
    UnitError(#[from] UnitError),
}

#[derive(Debug, Clone)]
pub struct PowerThrustCurve {
    speeds: Vec<f64>,
    power: Vec<f64>,
    thrust: Vec<f64>,
    interpolation: Interpolation,

    // Node derivatives, only filled for Pchip
    power_slopes: Vec<f64>,
    thrust_slopes: Vec<f64>,
}

impl PowerThrustCurve {
    /// Build a curve from SI samples (m/s, W, -)
    pub fn new(samples: &[CurveSample], interpolation: Interpolation) -> Result<Self, CurveError> {
        if samples.len() < 2 {
            return Err(CurveError::TooFewSamples(samples.len()));
        }

        for sample in samples {
            if !sample.wind_speed.is_finite() || sample.wind_speed < 0.0 {
                return Err(CurveError::InvalidValue {
                    quantity: "wind speed",
                    value: sample.wind_speed,
                    wind_speed: sample.wind_speed,
                });
            }
            if !sample.power.is_finite() || sample.power < 0.0 {
                return Err(CurveError::InvalidValue {
                    quantity: "power",
                    value: sample.power,
                    wind_speed: sample.wind_speed,
                });
            }
            if !sample.thrust_coefficient.is_finite() || sample.thrust_coefficient < 0.0 {
                return Err(CurveError::InvalidValue {
                    quantity: "thrust coefficient",
                    value: sample.thrust_coefficient,
                    wind_speed: sample.wind_speed,
                });
            }
        }

        for pair in samples.windows(2) {
            if pair[1].wind_speed <= pair[0].wind_speed {
                return Err(CurveError::NonIncreasingSpeed {
                    previous: pair[0].wind_speed,
                    next: pair[1].wind_speed,
                });
            }
        }

        let mut curve = Self {
            speeds: samples.iter().map(|s| s.wind_speed).collect(),
            power: samples.iter().map(|s| s.power).collect(),
            thrust: samples.iter().map(|s| s.thrust_coefficient).collect(),
            interpolation,
            power_slopes: Vec::new(),
            thrust_slopes: Vec::new(),
        };
        curve.prepare_slopes();
        Ok(curve)
    }

    /// Build a curve from separate columns, with power given in `power_unit`
    ///
    /// # Arguments
    /// * `wind_speeds` - m/s, strictly increasing
    /// * `power` - power column in `power_unit` ("w", "kW", "MW", ...)
    /// * `thrust_coefficients` - Ct column
    pub fn from_tabular(
        wind_speeds: &[f64],
        power: &[f64],
        power_unit: &str,
        thrust_coefficients: &[f64],
        interpolation: Interpolation,
    ) -> Result<Self, CurveError> {
        if wind_speeds.len() != power.len() || wind_speeds.len() != thrust_coefficients.len() {
            return Err(CurveError::ColumnMismatch {
                speeds: wind_speeds.len(),
                power: power.len(),
                thrust: thrust_coefficients.len(),
            });
        }

        let to_watts = PowerValue::watts_per_unit(power_unit)?;
        let samples: Vec<CurveSample> = wind_speeds
            .iter()
            .zip(power)
            .zip(thrust_coefficients)
            .map(|((&ws, &p), &ct)| CurveSample::new(ws, p * to_watts, ct))
            .collect();

        Self::new(&samples, interpolation)
    }

    /// Same table with a different interpolation method
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self.prepare_slopes();
        self
    }

    fn prepare_slopes(&mut self) {
        match self.interpolation {
            Interpolation::Linear => {
                self.power_slopes.clear();
                self.thrust_slopes.clear();
            }
            Interpolation::Pchip => {
                self.power_slopes = pchip_slopes(&self.speeds, &self.power);
                self.thrust_slopes = pchip_slopes(&self.speeds, &self.thrust);
            }
        }
    }

    /// Power (W) and thrust coefficient at a wind speed (m/s)
    pub fn evaluate(&self, wind_speed: f64) -> (f64, f64) {
        let last = self.speeds.len() - 1;

        // Also rejects NaN
        if !(wind_speed >= self.speeds[0] && wind_speed <= self.speeds[last]) {
            return (0.0, 0.0);
        }

        let upper = self.speeds.partition_point(|&s| s < wind_speed);
        if self.speeds[upper] == wind_speed {
            return (self.power[upper], self.thrust[upper]);
        }

        let lower = upper - 1;
        match self.interpolation {
            Interpolation::Linear => {
                let t = (wind_speed - self.speeds[lower]) / (self.speeds[upper] - self.speeds[lower]);
                (
                    lerp(self.power[lower], self.power[upper], t),
                    lerp(self.thrust[lower], self.thrust[upper], t),
                )
            }
            Interpolation::Pchip => (
                hermite(&self.speeds, &self.power, &self.power_slopes, lower, wind_speed).max(0.0),
                hermite(&self.speeds, &self.thrust, &self.thrust_slopes, lower, wind_speed).max(0.0),
            ),
        }
    }

    /// UOM flavoured [`evaluate`](Self::evaluate)
    pub fn evaluate_velocity(&self, wind_speed: WindSpeed) -> (Power, f64) {
        let (power, ct) = self.evaluate(wind_speed.get::<meter_per_second>());
        (Power::new::<watt>(power), ct)
    }

    pub fn power(&self, wind_speed: f64) -> f64 {
        self.evaluate(wind_speed).0
    }

    pub fn thrust_coefficient(&self, wind_speed: f64) -> f64 {
        self.evaluate(wind_speed).1
    }

    /// Tabulated (first, last) wind speed in m/s
    pub fn speed_range(&self) -> (f64, f64) {
        (self.speeds[0], self.speeds[self.speeds.len() - 1])
    }

    /// Largest tabulated power
    pub fn rated_power(&self) -> Power {
        let max = self.power.iter().copied().fold(0.0, f64::max);
        Power::new::<watt>(max)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn samples(&self) -> impl Iterator<Item = CurveSample> + '_ {
        self.speeds
            .iter()
            .zip(&self.power)
            .zip(&self.thrust)
            .map(|((&ws, &p), &ct)| CurveSample::new(ws, p, ct))
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Cubic Hermite evaluation on interval `[x[i], x[i+1]]`
fn hermite(x: &[f64], y: &[f64], d: &[f64], i: usize, at: f64) -> f64 {
    let h = x[i + 1] - x[i];
    let t = (at - x[i]) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * y[i] + h10 * h * d[i] + h01 * y[i + 1] + h11 * h * d[i + 1]
}

/// Node derivatives for a monotone piecewise cubic (Fritsch-Carlson)
///
/// Interior nodes take the weighted harmonic mean of the adjacent secants, or
/// zero at a local extremum. End nodes use the one-sided three-point estimate,
/// limited so the end intervals stay monotone.
fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] <= 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = pchip_end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn pchip_end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
