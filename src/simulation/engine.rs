//! Farm simulation: wake propagation per flow case and AEP accumulation
//!
//! # Flow-case evaluation
//!
//! For one (direction, speed) case the layout is projected into the wind
//! frame and turbines are visited from upstream to downstream. Each turbine
//! collects a deficit from every turbine strictly upstream of it, using the
//! upstream turbine's thrust coefficient at its own (already resolved)
//! effective speed. The deficits are combined by the configured
//! superposition rule and applied to the turbine's free-stream speed.
//!
//! Cases are independent and run in parallel. Cancellation is checked before
//! a case starts, never during one.

use crate::layout::FarmLayout;
use crate::simulation::error::*;
use crate::simulation::options::SimulationOptions;
use crate::simulation::result::{SimulationResult, SkippedCase};
use crate::site::{FlowCase, WindResourceModel};
use crate::turbine::{TurbineCatalog, TurbineModel};
use crate::types::*;
use crate::wake::{GeometryProjector, JensenDeficit, ProjectedLayout, WakeDeficitModel};
use nalgebra as na;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Pairs closer than this along the wind (meters) do not wake each other
pub const MIN_DOWNSTREAM_DISTANCE: f64 = 1e-6;

/// Shared flag for stopping a running simulation between flow cases
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-turbine data resolved once per run
struct PlacedTurbine<'a> {
    id: u32,
    model: &'a TurbineModel,
    /// m
    rotor_diameter: f64,
    height_factor: f64,
}

/// Per-turbine values for one flow case
struct CaseOutput {
    effective_speed: Vec<f64>,
    power: Vec<f64>,
    free_power: Vec<f64>,
}

pub struct FarmSimulationEngine {
    catalog: TurbineCatalog,
    deficit_model: Box<dyn WakeDeficitModel>,
    options: SimulationOptions,
}

impl FarmSimulationEngine {
    /// Engine with a Jensen deficit model using `options.expansion_k`
    pub fn new(catalog: TurbineCatalog, options: SimulationOptions) -> Result<Self, SimulationError> {
        if catalog.is_empty() {
            return Err(ConfigurationError::EmptyCatalog.into());
        }
        options.validate()?;
        let deficit_model = JensenDeficit::new(options.expansion_k)?;
        debug!(
            models = catalog.len(),
            expansion_k = options.expansion_k,
            "Created farm simulation engine"
        );

        Ok(Self {
            catalog,
            deficit_model: Box::new(deficit_model),
            options,
        })
    }

    /// Replaces the deficit model; `expansion_k` in the options no longer applies
    pub fn with_deficit_model(mut self, model: impl WakeDeficitModel + 'static) -> Self {
        self.deficit_model = Box::new(model);
        self
    }

    pub fn catalog(&self) -> &TurbineCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Runs every flow case with the configured `wake_enabled` setting
    pub fn simulate(
        &self,
        layout: &FarmLayout,
        resource: &WindResourceModel,
    ) -> Result<SimulationResult, SimulationError> {
        self.simulate_with(layout, resource, self.options.wake_enabled, None)
    }

    /// Runs every flow case
    ///
    /// Layout and grid problems fail the whole call before any case runs. A
    /// case producing non-finite values is left out of the totals and listed
    /// in [`SimulationResult::skipped_cases`].
    pub fn simulate_with(
        &self,
        layout: &FarmLayout,
        resource: &WindResourceModel,
        wake_enabled: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<SimulationResult, SimulationError> {
        layout.validate(&self.catalog)?;

        let curve_range = self
            .catalog
            .speed_range()
            .ok_or(ConfigurationError::EmptyCatalog)?;
        let direction_bins = self.options.directions.resolve(resource)?;
        let speed_bins = self.options.speeds.resolve(curve_range)?;

        let warnings = if self.options.speeds.is_user_defined() {
            domain_warnings(&speed_bins, curve_range)
        } else {
            Vec::new()
        };
        for warning in &warnings {
            warn!("{warning}");
        }

        let cases = resource.integrate_over(&direction_bins, &speed_bins)?;
        let speed_count = speed_bins.len();
        let total = cases.len();

        let turbines = self.place_turbines(layout, resource);
        info!(
            turbines = turbines.len(),
            flow_cases = total,
            wake_enabled,
            "Starting farm simulation"
        );

        let projections: Vec<ProjectedLayout> = if wake_enabled {
            cases
                .par_iter()
                .step_by(speed_count)
                .map(|case| GeometryProjector::project_layout(layout, case.direction_angle()))
                .collect()
        } else {
            Vec::new()
        };
        debug!(directions = projections.len(), "Projected layout");

        let outputs: Vec<Option<Result<CaseOutput, FlowCaseError>>> = cases
            .par_iter()
            .enumerate()
            .map(|(index, case)| {
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    return None;
                }
                let projection = projections.get(index / speed_count);
                Some(self.evaluate_case(case, projection, &turbines))
            })
            .collect();

        let completed = outputs.iter().filter(|o| o.is_some()).count();
        if completed < total {
            warn!(completed, total, "Farm simulation cancelled");
            return Err(SimulationError::Cancelled { completed, total });
        }

        let n = turbines.len();
        let mut effective_speed = na::DMatrix::zeros(total, n);
        let mut power = na::DMatrix::zeros(total, n);
        let mut free_power = na::DMatrix::zeros(total, n);
        let mut skipped_cases = Vec::new();

        for (index, output) in outputs.into_iter().flatten().enumerate() {
            match output {
                Ok(output) => {
                    effective_speed.set_row(index, &na::RowDVector::from_vec(output.effective_speed));
                    power.set_row(index, &na::RowDVector::from_vec(output.power));
                    free_power.set_row(index, &na::RowDVector::from_vec(output.free_power));
                }
                Err(error) => {
                    let case = cases[index];
                    warn!(
                        direction = case.direction,
                        wind_speed = case.wind_speed,
                        "Skipping flow case: {error}"
                    );
                    skipped_cases.push(SkippedCase { index, case, error });
                }
            }
        }

        let result = SimulationResult {
            turbine_ids: turbines.iter().map(|t| t.id).collect(),
            rated_power: turbines
                .iter()
                .map(|t| t.model.rated_power().get::<watt>())
                .collect(),
            height_factors: turbines.iter().map(|t| t.height_factor).collect(),
            flow_cases: cases,
            speed_count,
            effective_speed,
            power,
            free_power,
            skipped_cases,
            warnings,
            wake_enabled,
            hours_per_year: self.options.hours_per_year,
        };

        info!(
            aep_gwh = result.aep().get::<gigawatt_hour>(),
            wake_loss_gwh = result.wake_loss().get::<gigawatt_hour>(),
            skipped = result.skipped_cases.len(),
            "Farm simulation finished"
        );
        Ok(result)
    }

    fn place_turbines<'a>(
        &'a self,
        layout: &FarmLayout,
        resource: &WindResourceModel,
    ) -> Vec<PlacedTurbine<'a>> {
        // Model indices were checked by layout validation
        layout
            .turbines()
            .iter()
            .filter_map(|turbine| {
                let model = self.catalog.get(turbine.model)?;
                Some(PlacedTurbine {
                    id: turbine.id,
                    model,
                    rotor_diameter: model.rotor_diameter.get::<meter>(),
                    height_factor: resource.height_correction(turbine.hub_height(model)),
                })
            })
            .collect()
    }

    /// Effective speed and power of every turbine for one flow case
    ///
    /// Without a projection the wake model is off and each turbine sees its
    /// free-stream speed.
    fn evaluate_case(
        &self,
        case: &FlowCase,
        projection: Option<&ProjectedLayout>,
        turbines: &[PlacedTurbine],
    ) -> Result<CaseOutput, FlowCaseError> {
        let n = turbines.len();
        let free_speed: Vec<f64> = turbines
            .iter()
            .map(|t| case.wind_speed * t.height_factor)
            .collect();
        let free_power: Vec<f64> = turbines
            .iter()
            .zip(&free_speed)
            .map(|(t, &v)| t.model.curve.power(v))
            .collect();

        let (effective_speed, power) = match projection {
            None => (free_speed.clone(), free_power.clone()),
            Some(projection) => {
                let mut effective_speed = vec![0.0; n];
                let mut power = vec![0.0; n];
                let mut thrust = vec![0.0; n];
                let mut deficits = Vec::with_capacity(n);
                let order = projection.order();

                for (position, &down) in order.iter().enumerate() {
                    deficits.clear();
                    for &up in &order[..position] {
                        let distance = projection.downstream_distance(up, down);
                        if distance <= MIN_DOWNSTREAM_DISTANCE {
                            continue;
                        }
                        let deficit = self.deficit_model.rotor_deficit(
                            distance,
                            projection.lateral_offset(up, down),
                            turbines[up].rotor_diameter,
                            thrust[up],
                            turbines[down].rotor_diameter,
                            self.options.rotor_overlap,
                        );
                        if !deficit.is_finite() {
                            return Err(FlowCaseError::NonFinite {
                                turbine: turbines[down].id,
                                quantity: "wake deficit",
                            });
                        }
                        if deficit > 0.0 {
                            deficits.push(deficit);
                        }
                    }

                    let speed = self.options.superposition.combine(free_speed[down], &deficits);
                    let (p, ct) = turbines[down].model.curve.evaluate(speed);
                    effective_speed[down] = speed;
                    power[down] = p.min(free_power[down]);
                    thrust[down] = ct;
                }
                (effective_speed, power)
            }
        };

        for (t, turbine) in turbines.iter().enumerate() {
            if !effective_speed[t].is_finite() {
                return Err(FlowCaseError::NonFinite {
                    turbine: turbine.id,
                    quantity: "effective wind speed",
                });
            }
            if !power[t].is_finite() || !free_power[t].is_finite() {
                return Err(FlowCaseError::NonFinite {
                    turbine: turbine.id,
                    quantity: "power",
                });
            }
        }

        Ok(CaseOutput {
            effective_speed,
            power,
            free_power,
        })
    }
}

/// Requested speeds outside the union of curve ranges
fn domain_warnings(speeds: &[WindSpeed], range: (f64, f64)) -> Vec<DomainWarning> {
    speeds
        .iter()
        .map(|v| v.get::<meter_per_second>())
        .filter(|&v| v < range.0 || v > range.1)
        .map(|wind_speed| DomainWarning::speed_outside_curves(wind_speed, range))
        .collect()
}

/// One-shot simulation with the default Jensen deficit model
pub fn simulate(
    catalog: &TurbineCatalog,
    layout: &FarmLayout,
    resource: &WindResourceModel,
    options: &SimulationOptions,
) -> Result<SimulationResult, SimulationError> {
    FarmSimulationEngine::new(catalog.clone(), options.clone())?.simulate(layout, resource)
}
