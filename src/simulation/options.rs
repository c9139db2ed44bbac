//! Request parameters for a simulation run
//!
//! Options are plain serde data with defaults for every field, so a TOML
//! document only needs to name what it changes:
//!
//! ```toml
//! expansion_k = 0.05
//! superposition = "linear_sum"
//!
//! [directions]
//! kind = "uniform"
//! count = 36
//!
//! [speeds]
//! kind = "range"
//! start = 3.0
//! stop = 25.0
//! step = 1.0
//! ```

use crate::site::WindResourceModel;
use crate::types::*;
use crate::wake::{DEFAULT_EXPANSION_K, RotorOverlap, Superposition};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOURS_PER_YEAR: f64 = 8760.0;
pub const DEFAULT_DIRECTION_COUNT: usize = 360;
pub const DEFAULT_SPEED_STEP: f64 = 1.0;
/// Largest number of speeds a stepped grid may expand to
pub const MAX_SPEED_GRID_LEN: usize = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Failed to parse options: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid {grid} grid: {reason}")]
    InvalidGrid { grid: &'static str, reason: String },

    #[error("Hours per year must be positive and finite, got {0}")]
    InvalidHours(f64),
}

/// Wind directions to evaluate, degrees clockwise from north
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectionGrid {
    /// `count` evenly spaced directions starting at north
    Uniform { count: usize },
    /// One direction per resource sector, at the sector centres
    Sectors,
    Explicit { degrees: Vec<f64> },
}

impl Default for DirectionGrid {
    fn default() -> Self {
        DirectionGrid::Uniform {
            count: DEFAULT_DIRECTION_COUNT,
        }
    }
}

impl DirectionGrid {
    pub fn resolve(&self, resource: &WindResourceModel) -> Result<Vec<WindDirection>, OptionsError> {
        let degrees: Vec<f64> = match self {
            DirectionGrid::Uniform { count } => {
                if *count == 0 {
                    return Err(invalid_grid("direction", "count must be at least 1"));
                }
                (0..*count).map(|i| i as f64 * 360.0 / *count as f64).collect()
            }
            DirectionGrid::Sectors => (0..resource.sector_count())
                .map(|i| resource.sector_center(i))
                .collect(),
            DirectionGrid::Explicit { degrees } => {
                if degrees.is_empty() {
                    return Err(invalid_grid("direction", "no directions given"));
                }
                if let Some(d) = degrees.iter().find(|d| !d.is_finite()) {
                    return Err(invalid_grid("direction", format!("non-finite direction {d}")));
                }
                degrees.clone()
            }
        };

        Ok(degrees.into_iter().map(Angle::new::<degree>).collect())
    }
}

/// Free-stream wind speeds to evaluate, m/s at the resource reference height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeedGrid {
    /// Steps across the union of catalog curve ranges, padded one step each side
    CurveRange {
        #[serde(default = "default_speed_step")]
        step: f64,
    },
    /// Inclusive `start..=stop` in steps of `step`
    Range { start: f64, stop: f64, step: f64 },
    Explicit { speeds: Vec<f64> },
}

fn default_speed_step() -> f64 {
    DEFAULT_SPEED_STEP
}

impl Default for SpeedGrid {
    fn default() -> Self {
        SpeedGrid::CurveRange {
            step: DEFAULT_SPEED_STEP,
        }
    }
}

impl SpeedGrid {
    /// Grid speeds in ascending order; `curve_range` is the catalog union in m/s
    pub fn resolve(&self, curve_range: (f64, f64)) -> Result<Vec<WindSpeed>, OptionsError> {
        let speeds = match self {
            SpeedGrid::CurveRange { step } => {
                check_step(*step)?;
                let start = (curve_range.0 - step).max(0.0);
                stepped(start, curve_range.1 + step, *step)?
            }
            SpeedGrid::Range { start, stop, step } => {
                check_step(*step)?;
                if !start.is_finite() || !stop.is_finite() || *start < 0.0 || stop < start {
                    return Err(invalid_grid(
                        "speed",
                        format!("range {start}..={stop} must be finite, non-negative and ordered"),
                    ));
                }
                stepped(*start, *stop, *step)?
            }
            SpeedGrid::Explicit { speeds } => {
                if speeds.is_empty() {
                    return Err(invalid_grid("speed", "no speeds given"));
                }
                for pair in speeds.windows(2) {
                    if pair[1] <= pair[0] {
                        return Err(invalid_grid("speed", "speeds must be strictly increasing"));
                    }
                }
                if let Some(v) = speeds.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(invalid_grid("speed", format!("invalid speed {v}")));
                }
                speeds.clone()
            }
        };

        Ok(speeds.into_iter().map(Velocity::new::<meter_per_second>).collect())
    }

    /// True when the caller chose the speeds rather than deriving them from the curves
    pub fn is_user_defined(&self) -> bool {
        !matches!(self, SpeedGrid::CurveRange { .. })
    }
}

fn check_step(step: f64) -> Result<(), OptionsError> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(invalid_grid("speed", format!("step must be positive, got {step}")))
    }
}

/// `start, start + step, ...` up to and including `stop` (with rounding slack)
fn stepped(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, OptionsError> {
    let steps = ((stop - start) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_SPEED_GRID_LEN as f64 {
        return Err(invalid_grid(
            "speed",
            format!("step {step} gives more than {MAX_SPEED_GRID_LEN} speeds"),
        ));
    }
    let count = steps as usize;
    Ok((0..=count).map(|i| start + i as f64 * step).collect())
}

fn invalid_grid(grid: &'static str, reason: impl Into<String>) -> OptionsError {
    OptionsError::InvalidGrid {
        grid,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationOptions {
    pub directions: DirectionGrid,
    pub speeds: SpeedGrid,
    pub wake_enabled: bool,
    /// Jensen wake expansion coefficient
    pub expansion_k: f64,
    pub superposition: Superposition,
    pub rotor_overlap: RotorOverlap,
    pub hours_per_year: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            directions: DirectionGrid::default(),
            speeds: SpeedGrid::default(),
            wake_enabled: true,
            expansion_k: DEFAULT_EXPANSION_K,
            superposition: Superposition::default(),
            rotor_overlap: RotorOverlap::default(),
            hours_per_year: DEFAULT_HOURS_PER_YEAR,
        }
    }
}

impl SimulationOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_directions(mut self, directions: DirectionGrid) -> Self {
        self.directions = directions;
        self
    }

    pub fn with_speeds(mut self, speeds: SpeedGrid) -> Self {
        self.speeds = speeds;
        self
    }

    pub fn with_wake_enabled(mut self, wake_enabled: bool) -> Self {
        self.wake_enabled = wake_enabled;
        self
    }

    pub fn with_expansion_k(mut self, expansion_k: f64) -> Self {
        self.expansion_k = expansion_k;
        self
    }

    pub fn with_superposition(mut self, superposition: Superposition) -> Self {
        self.superposition = superposition;
        self
    }

    pub fn with_rotor_overlap(mut self, rotor_overlap: RotorOverlap) -> Self {
        self.rotor_overlap = rotor_overlap;
        self
    }

    /// Checks the fields that do not depend on the catalog or resource
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(self.hours_per_year.is_finite() && self.hours_per_year > 0.0) {
            return Err(OptionsError::InvalidHours(self.hours_per_year));
        }
        match &self.directions {
            DirectionGrid::Uniform { count: 0 } => {
                return Err(invalid_grid("direction", "count must be at least 1"));
            }
            DirectionGrid::Explicit { degrees } if degrees.is_empty() => {
                return Err(invalid_grid("direction", "no directions given"));
            }
            _ => {}
        }
        match &self.speeds {
            SpeedGrid::CurveRange { step } | SpeedGrid::Range { step, .. } => check_step(*step),
            SpeedGrid::Explicit { speeds } if speeds.is_empty() => {
                Err(invalid_grid("speed", "no speeds given"))
            }
            SpeedGrid::Explicit { .. } => Ok(()),
        }
    }

    pub fn reference_period(&self) -> Time {
        Time::new::<hour>(self.hours_per_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn resource() -> WindResourceModel {
        WindResourceModel::new(&[0.25; 4], &[9.0; 4], &[2.0; 4]).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = SimulationOptions::default();
        assert!(options.wake_enabled);
        assert_eq!(options.expansion_k, 0.04);
        assert_eq!(options.superposition, Superposition::SquaredSum);
        assert_eq!(options.rotor_overlap, RotorOverlap::RotorCenter);
        assert_eq!(options.hours_per_year, 8760.0);
        assert_eq!(options.directions, DirectionGrid::Uniform { count: 360 });
    }

    #[test]
    fn test_from_toml() {
        let options = SimulationOptions::from_toml_str(
            r#"
            expansion_k = 0.05
            superposition = "linear_sum"
            rotor_overlap = "rotor_area"

            [directions]
            kind = "sectors"

            [speeds]
            kind = "range"
            start = 3.0
            stop = 25.0
            step = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(options.expansion_k, 0.05);
        assert_eq!(options.superposition, Superposition::LinearSum);
        assert_eq!(options.rotor_overlap, RotorOverlap::RotorArea);
        assert_eq!(options.directions, DirectionGrid::Sectors);
        assert!(options.wake_enabled);

        let speeds = options.speeds.resolve((3.0, 25.0)).unwrap();
        assert_eq!(speeds.len(), 45);
        assert_relative_eq!(speeds[44].get::<meter_per_second>(), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SimulationOptions::from_toml_str("").unwrap(), SimulationOptions::default());
    }

    #[test]
    fn test_curve_range_step_defaults() {
        let options = SimulationOptions::from_toml_str("[speeds]\nkind = \"curve_range\"").unwrap();
        assert_eq!(options.speeds, SpeedGrid::CurveRange { step: 1.0 });
    }

    #[test]
    fn test_rejects_bad_options() {
        assert!(matches!(
            SimulationOptions::from_toml_str("hours_per_year = 0.0"),
            Err(OptionsError::InvalidHours(_))
        ));
        assert!(matches!(
            SimulationOptions::from_toml_str("wake = false"),
            Err(OptionsError::Toml(_))
        ));
        assert!(matches!(
            SimulationOptions::from_toml_str("[directions]\nkind = \"uniform\"\ncount = 0"),
            Err(OptionsError::InvalidGrid { grid: "direction", .. })
        ));
    }

    #[test]
    fn test_curve_range_is_padded() {
        let speeds = SpeedGrid::default().resolve((3.0, 25.0)).unwrap();
        let values: Vec<f64> = speeds.iter().map(|v| v.get::<meter_per_second>()).collect();
        assert_eq!(values.first(), Some(&2.0));
        assert_eq!(values.last(), Some(&26.0));
        assert_eq!(values.len(), 25);
    }

    #[test]
    fn test_rejects_oversized_grids() {
        let tiny = SpeedGrid::Range {
            start: 0.0,
            stop: 30.0,
            step: 1e-300,
        };
        assert!(matches!(
            tiny.resolve((3.0, 25.0)),
            Err(OptionsError::InvalidGrid { grid: "speed", .. })
        ));
        assert!(matches!(
            SpeedGrid::CurveRange { step: 1e-9 }.resolve((3.0, 25.0)),
            Err(OptionsError::InvalidGrid { grid: "speed", .. })
        ));

        let fine = SpeedGrid::Range {
            start: 0.0,
            stop: 30.0,
            step: 0.01,
        };
        assert_eq!(fine.resolve((3.0, 25.0)).unwrap().len(), 3001);
    }

    #[test]
    fn test_curve_range_clamps_at_zero() {
        let speeds = SpeedGrid::CurveRange { step: 2.0 }.resolve((1.0, 5.0)).unwrap();
        assert_eq!(speeds[0].get::<meter_per_second>(), 0.0);
    }

    #[test]
    fn test_direction_grids() {
        let uniform = DirectionGrid::Uniform { count: 8 }.resolve(&resource()).unwrap();
        assert_eq!(uniform.len(), 8);
        assert_relative_eq!(uniform[3].get::<degree>(), 135.0, epsilon = 1e-12);

        let sectors = DirectionGrid::Sectors.resolve(&resource()).unwrap();
        let degrees: Vec<f64> = sectors.iter().map(|d| d.get::<degree>()).collect();
        assert_eq!(degrees, vec![0.0, 90.0, 180.0, 270.0]);

        assert!(
            DirectionGrid::Explicit { degrees: vec![] }
                .resolve(&resource())
                .is_err()
        );
    }

    #[test]
    fn test_explicit_speeds_must_increase() {
        let grid = SpeedGrid::Explicit {
            speeds: vec![4.0, 8.0, 8.0],
        };
        assert!(grid.resolve((3.0, 25.0)).is_err());
        assert!(grid.is_user_defined());
        assert!(!SpeedGrid::default().is_user_defined());
    }
}
