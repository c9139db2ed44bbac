use crate::turbine::power_curve::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A turbine type: rotor geometry plus its power/thrust response
#[derive(Debug, Clone)]
pub struct TurbineModel {
    pub name: String,
    pub rotor_diameter: RotorDiameter,
    pub hub_height: HubHeight,
    pub curve: PowerThrustCurve,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unit conversion error: {0}")]
    UnitError(#[from] UnitError),

    #[error("Turbine model {model}: {source}")]
    InvalidCurve {
        model: String,
        #[source]
        source: CurveError,
    },

    #[error("Turbine model {model}: {what} must be positive, got {value}")]
    NonPositiveDimension {
        model: String,
        what: &'static str,
        value: DisplayLength,
    },

    #[error("Turbine model {0} is already in the catalog")]
    DuplicateModel(String),
}

impl TurbineModel {
    pub fn new(
        name: impl Into<String>,
        rotor_diameter: RotorDiameter,
        hub_height: HubHeight,
        curve: PowerThrustCurve,
    ) -> Result<Self, CatalogError> {
        let name = name.into();

        for (what, value) in [("rotor diameter", rotor_diameter), ("hub height", hub_height)] {
            let meters = value.get::<meter>();
            if !meters.is_finite() || meters <= 0.0 {
                return Err(CatalogError::NonPositiveDimension {
                    model: name,
                    what,
                    value: DisplayLength(value),
                });
            }
        }

        Ok(Self {
            name,
            rotor_diameter,
            hub_height,
            curve,
        })
    }

    /// Rotor radius in meters
    pub fn rotor_radius(&self) -> f64 {
        self.rotor_diameter.get::<meter>() / 2.0
    }

    pub fn rated_power(&self) -> Power {
        self.curve.rated_power()
    }
}

/// Serialized description of a turbine model
///
/// Mirrors the usual tabular datasheet: a wind-speed column, a power column in
/// `power_unit`, and a thrust-coefficient column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbineModelSpec {
    pub name: String,
    pub diameter: LengthValue,
    pub hub_height: LengthValue,
    pub power_unit: String,
    pub wind_speeds: Vec<f64>,
    pub power: Vec<f64>,
    pub thrust_coefficients: Vec<f64>,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl TurbineModelSpec {
    pub fn build(&self) -> Result<TurbineModel, CatalogError> {
        let curve = PowerThrustCurve::from_tabular(
            &self.wind_speeds,
            &self.power,
            &self.power_unit,
            &self.thrust_coefficients,
            self.interpolation,
        )
        .map_err(|source| CatalogError::InvalidCurve {
            model: self.name.clone(),
            source,
        })?;

        TurbineModel::new(
            self.name.clone(),
            self.diameter.to_length()?,
            self.hub_height.to_length()?,
            curve,
        )
    }
}

/// Registry of turbine models referenced by index from a farm layout
#[derive(Debug, Clone, Default)]
pub struct TurbineCatalog {
    models: Vec<TurbineModel>,

    /// Maps model name -> index into `models`
    by_name: HashMap<String, usize>,
}

impl TurbineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a JSON array of [`TurbineModelSpec`]
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let specs: Vec<TurbineModelSpec> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for spec in &specs {
            catalog.add_model(spec.build()?)?;
        }
        tracing::debug!("Loaded turbine catalog with {} models", catalog.len());
        Ok(catalog)
    }

    /// Add a model, returning the index layouts use to reference it
    pub fn add_model(&mut self, model: TurbineModel) -> Result<usize, CatalogError> {
        if self.by_name.contains_key(&model.name) {
            return Err(CatalogError::DuplicateModel(model.name));
        }
        let index = self.models.len();
        self.by_name.insert(model.name.clone(), index);
        self.models.push(model);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&TurbineModel> {
        self.models.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TurbineModel> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn models(&self) -> &[TurbineModel] {
        &self.models
    }

    /// Union of all curve speed ranges (m/s)
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        self.models
            .iter()
            .map(|m| m.curve.speed_range())
            .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
    }

    /// Switch every curve to the given interpolation method
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        for model in &mut self.models {
            model.curve = model.curve.clone().with_interpolation(interpolation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }
}
