use serde::{Deserialize, Serialize};

/// Rule for combining simultaneous wake deficits at one rotor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Superposition {
    /// Root of the sum of squared deficits
    #[default]
    SquaredSum,
    /// Plain sum of deficits
    LinearSum,
}

impl Superposition {
    /// Net fractional deficit, capped at 1
    pub fn total_deficit(&self, deficits: &[f64]) -> f64 {
        let total = match self {
            Superposition::SquaredSum => deficits.iter().map(|d| d * d).sum::<f64>().sqrt(),
            Superposition::LinearSum => deficits.iter().sum(),
        };
        total.clamp(0.0, 1.0)
    }

    /// Effective speed after applying all deficits to `free_stream_speed`
    pub fn combine(&self, free_stream_speed: f64, deficits: &[f64]) -> f64 {
        if deficits.is_empty() {
            return free_stream_speed;
        }
        (free_stream_speed * (1.0 - self.total_deficit(deficits))).max(0.0)
    }
}
