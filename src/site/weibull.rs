use serde::{Deserialize, Serialize};

/// Two-parameter Weibull wind-speed distribution
///
/// `scale` (A) is in m/s, `shape` (k) is dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weibull {
    pub scale: f64,
    pub shape: f64,
}

impl Weibull {
    pub fn new(scale: f64, shape: f64) -> Self {
        Self { scale, shape }
    }

    pub fn is_valid(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.shape.is_finite() && self.shape > 0.0
    }

    /// Probability density at `speed` (per m/s)
    ///
    /// `f(v) = (k/A) (v/A)^(k-1) exp(-(v/A)^k)`
    pub fn pdf(&self, speed: f64) -> f64 {
        if speed < 0.0 {
            return 0.0;
        }
        let x = speed / self.scale;
        (self.shape / self.scale) * x.powf(self.shape - 1.0) * (-x.powf(self.shape)).exp()
    }

    /// Cumulative probability of a speed below `speed`
    pub fn cdf(&self, speed: f64) -> f64 {
        if speed <= 0.0 {
            return 0.0;
        }
        if speed.is_infinite() {
            return 1.0;
        }
        1.0 - (-(speed / self.scale).powf(self.shape)).exp()
    }

    /// Probability mass between two speeds
    pub fn mass_between(&self, lower: f64, upper: f64) -> f64 {
        (self.cdf(upper) - self.cdf(lower)).max(0.0)
    }
}
