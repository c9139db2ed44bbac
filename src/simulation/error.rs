use crate::layout::LayoutError;
use crate::simulation::options::OptionsError;
use crate::site::ResourceError;
use crate::turbine::{CatalogError, CurveError};
use crate::types::*;
use crate::wake::WakeModelError;

/// Malformed inputs, detected before any flow case runs
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    WakeModel(#[from] WakeModelError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("Invalid layout: {0}")]
    Layout(LayoutError),

    #[error("Turbine catalog is empty")]
    EmptyCatalog,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Turbines {first} and {second} share a position")]
    GeometryDegenerate { first: u32, second: u32 },

    #[error("Simulation cancelled after {completed} of {total} flow cases")]
    Cancelled { completed: usize, total: usize },
}

impl From<LayoutError> for SimulationError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::GeometryDegenerate { first, second, .. } => {
                SimulationError::GeometryDegenerate { first, second }
            }
            other => SimulationError::Configuration(ConfigurationError::Layout(other)),
        }
    }
}

impl From<CurveError> for SimulationError {
    fn from(err: CurveError) -> Self {
        SimulationError::Configuration(err.into())
    }
}

impl From<CatalogError> for SimulationError {
    fn from(err: CatalogError) -> Self {
        SimulationError::Configuration(err.into())
    }
}

impl From<ResourceError> for SimulationError {
    fn from(err: ResourceError) -> Self {
        SimulationError::Configuration(err.into())
    }
}

impl From<WakeModelError> for SimulationError {
    fn from(err: WakeModelError) -> Self {
        SimulationError::Configuration(err.into())
    }
}

impl From<OptionsError> for SimulationError {
    fn from(err: OptionsError) -> Self {
        SimulationError::Configuration(err.into())
    }
}

/// Failure confined to a single flow case; drops only that case's contribution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowCaseError {
    #[error("Non-finite {quantity} at turbine {turbine}")]
    NonFinite { turbine: u32, quantity: &'static str },
}

/// Non-fatal conditions reported alongside a result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainWarning {
    /// Requested speed outside the union of all curve ranges
    #[error("Wind speed {wind_speed} is outside every power curve ({cut_in} to {cut_out}), producing zero power")]
    SpeedOutsideCurves {
        wind_speed: DisplayVelocity,
        cut_in: DisplayVelocity,
        cut_out: DisplayVelocity,
    },
}

impl DomainWarning {
    /// Warning for `wind_speed` against the curve union `range`, both in m/s
    pub fn speed_outside_curves(wind_speed: f64, range: (f64, f64)) -> Self {
        let mps = |v: f64| DisplayVelocity(Velocity::new::<meter_per_second>(v));
        DomainWarning::SpeedOutsideCurves {
            wind_speed: mps(wind_speed),
            cut_in: mps(range.0),
            cut_out: mps(range.1),
        }
    }
}
