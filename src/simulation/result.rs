//! Outcome of a farm simulation and its AEP reductions
//!
//! Per-case data is stored as `flow case x turbine` matrices. Rows follow the
//! flow-case order (direction, then speed) and every reduction walks them in
//! that order, so totals are reproducible bit for bit.

use crate::simulation::error::{DomainWarning, FlowCaseError};
use crate::site::FlowCase;
use crate::types::*;
use nalgebra as na;

/// A flow case dropped from the totals
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCase {
    pub index: usize,
    pub case: FlowCase,
    pub error: FlowCaseError,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub(crate) turbine_ids: Vec<u32>,
    /// W, per turbine
    pub(crate) rated_power: Vec<f64>,
    pub(crate) height_factors: Vec<f64>,
    pub(crate) flow_cases: Vec<FlowCase>,
    pub(crate) speed_count: usize,
    /// m/s
    pub(crate) effective_speed: na::DMatrix<f64>,
    /// W, after wake losses
    pub(crate) power: na::DMatrix<f64>,
    /// W, at the free-stream speed
    pub(crate) free_power: na::DMatrix<f64>,
    pub(crate) skipped_cases: Vec<SkippedCase>,
    pub(crate) warnings: Vec<DomainWarning>,
    pub(crate) wake_enabled: bool,
    pub(crate) hours_per_year: f64,
}

impl SimulationResult {
    /// Expected annual energy with wake losses applied
    pub fn aep(&self) -> AnnualEnergy {
        energy(self.weighted_total(&self.power) * self.hours_per_year)
    }

    /// Expected annual energy with every turbine at its free-stream speed
    pub fn aep_without_wake_loss(&self) -> AnnualEnergy {
        energy(self.weighted_total(&self.free_power) * self.hours_per_year)
    }

    pub fn wake_loss(&self) -> AnnualEnergy {
        energy(
            (self.weighted_total(&self.free_power) - self.weighted_total(&self.power))
                * self.hours_per_year,
        )
    }

    /// Wake loss as a share of the no-wake AEP, 0 when nothing is produced
    pub fn wake_loss_fraction(&self) -> f64 {
        let free = self.weighted_total(&self.free_power);
        if free > 0.0 {
            (free - self.weighted_total(&self.power)) / free
        } else {
            0.0
        }
    }

    /// AEP per turbine, in layout order
    pub fn aep_per_turbine(&self) -> Vec<AnnualEnergy> {
        let mut totals = vec![0.0; self.turbine_ids.len()];
        for (c, case) in self.flow_cases.iter().enumerate() {
            for (t, total) in totals.iter_mut().enumerate() {
                *total += case.weight * self.power[(c, t)];
            }
        }
        totals
            .into_iter()
            .map(|w| energy(w * self.hours_per_year))
            .collect()
    }

    /// (direction in degrees, AEP) for each evaluated direction
    pub fn aep_per_direction(&self) -> Vec<(f64, AnnualEnergy)> {
        self.flow_cases
            .chunks(self.speed_count.max(1))
            .enumerate()
            .map(|(d, cases)| {
                let first = d * self.speed_count;
                let total: f64 = cases
                    .iter()
                    .enumerate()
                    .map(|(s, case)| case.weight * self.power.row(first + s).sum())
                    .sum();
                (cases[0].direction, energy(total * self.hours_per_year))
            })
            .collect()
    }

    /// (free-stream speed in m/s, AEP) for each evaluated speed
    pub fn aep_per_speed(&self) -> Vec<(f64, AnnualEnergy)> {
        let mut totals: Vec<(f64, f64)> = self
            .flow_cases
            .iter()
            .take(self.speed_count)
            .map(|case| (case.wind_speed, 0.0))
            .collect();
        for (c, case) in self.flow_cases.iter().enumerate() {
            totals[c % self.speed_count].1 += case.weight * self.power.row(c).sum();
        }
        totals
            .into_iter()
            .map(|(speed, w)| (speed, energy(w * self.hours_per_year)))
            .collect()
    }

    /// AEP over the energy the farm would make at rated power all year
    pub fn capacity_factor(&self) -> f64 {
        let rated: f64 = self.rated_power.iter().sum();
        if rated > 0.0 {
            self.weighted_total(&self.power) / rated
        } else {
            0.0
        }
    }

    pub fn effective_wind_speed(&self, case: usize, turbine: usize) -> Option<WindSpeed> {
        self.effective_speed
            .get((case, turbine))
            .map(|&v| Velocity::new::<meter_per_second>(v))
    }

    pub fn power(&self, case: usize, turbine: usize) -> Option<TurbinePower> {
        self.power.get((case, turbine)).map(|&p| Power::new::<watt>(p))
    }

    /// Effective speeds (m/s), one row per flow case
    pub fn effective_speeds(&self) -> &na::DMatrix<f64> {
        &self.effective_speed
    }

    /// Turbine powers (W), one row per flow case
    pub fn powers(&self) -> &na::DMatrix<f64> {
        &self.power
    }

    pub fn turbine_ids(&self) -> &[u32] {
        &self.turbine_ids
    }

    pub fn flow_cases(&self) -> &[FlowCase] {
        &self.flow_cases
    }

    /// Free-stream multipliers from the resource shear at each hub height
    pub fn height_factors(&self) -> &[f64] {
        &self.height_factors
    }

    pub fn skipped_cases(&self) -> &[SkippedCase] {
        &self.skipped_cases
    }

    pub fn warnings(&self) -> &[DomainWarning] {
        &self.warnings
    }

    pub fn wake_enabled(&self) -> bool {
        self.wake_enabled
    }

    pub fn hours_per_year(&self) -> f64 {
        self.hours_per_year
    }

    /// Sum of flow-case weights, 1 up to rounding
    pub fn total_weight(&self) -> f64 {
        self.flow_cases.iter().map(|c| c.weight).sum()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Turbines: {}, flow cases: {} ({} skipped), wake model {}",
                self.turbine_ids.len(),
                self.flow_cases.len(),
                self.skipped_cases.len(),
                if self.wake_enabled { "on" } else { "off" },
            ),
            format!("AEP: {}", DisplayEnergy(self.aep())),
            format!("AEP without wake loss: {}", DisplayEnergy(self.aep_without_wake_loss())),
            format!(
                "Wake loss: {} ({:.2}%)",
                DisplayEnergy(self.wake_loss()),
                100.0 * self.wake_loss_fraction()
            ),
            format!("Capacity factor: {:.1}%", 100.0 * self.capacity_factor()),
        ];
        for warning in &self.warnings {
            lines.push(format!("Warning: {warning}"));
        }
        lines.join("\n")
    }

    /// Weighted sum of farm power over flow cases, in W
    fn weighted_total(&self, power: &na::DMatrix<f64>) -> f64 {
        self.flow_cases
            .iter()
            .enumerate()
            .map(|(c, case)| case.weight * power.row(c).sum())
            .sum()
    }
}

fn energy(watt_hours: f64) -> AnnualEnergy {
    Energy::new::<watt_hour>(watt_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two turbines, two directions, two speeds
    fn result() -> SimulationResult {
        let flow_cases = vec![
            FlowCase { direction: 0.0, wind_speed: 8.0, weight: 0.3 },
            FlowCase { direction: 0.0, wind_speed: 12.0, weight: 0.2 },
            FlowCase { direction: 180.0, wind_speed: 8.0, weight: 0.4 },
            FlowCase { direction: 180.0, wind_speed: 12.0, weight: 0.1 },
        ];
        let free_power = na::DMatrix::from_row_slice(4, 2, &[
            1.0e6, 1.0e6,
            3.0e6, 3.0e6,
            1.0e6, 1.0e6,
            3.0e6, 3.0e6,
        ]);
        let power = na::DMatrix::from_row_slice(4, 2, &[
            1.0e6, 0.5e6,
            3.0e6, 2.0e6,
            0.6e6, 1.0e6,
            3.0e6, 3.0e6,
        ]);
        SimulationResult {
            turbine_ids: vec![0, 1],
            rated_power: vec![3.0e6, 3.0e6],
            height_factors: vec![1.0, 1.0],
            flow_cases,
            speed_count: 2,
            effective_speed: na::DMatrix::from_element(4, 2, 8.0),
            power,
            free_power,
            skipped_cases: Vec::new(),
            warnings: Vec::new(),
            wake_enabled: true,
            hours_per_year: 8760.0,
        }
    }

    #[test]
    fn test_aep_totals() {
        let r = result();
        // Weighted farm power: 0.3*1.5 + 0.2*5 + 0.4*1.6 + 0.1*6 = 2.69 MW
        assert_relative_eq!(r.aep().get::<megawatt_hour>(), 2.69 * 8760.0, max_relative = 1e-12);
        // Free: 0.3*2 + 0.2*6 + 0.4*2 + 0.1*6 = 3.2 MW
        assert_relative_eq!(
            r.aep_without_wake_loss().get::<megawatt_hour>(),
            3.2 * 8760.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(r.wake_loss().get::<megawatt_hour>(), 0.51 * 8760.0, max_relative = 1e-9);
        assert_relative_eq!(r.wake_loss_fraction(), 0.51 / 3.2, max_relative = 1e-9);
    }

    #[test]
    fn test_breakdowns_add_up() {
        let r = result();
        let total = r.aep().get::<megawatt_hour>();

        let per_turbine: f64 = r.aep_per_turbine().iter().map(|e| e.get::<megawatt_hour>()).sum();
        assert_relative_eq!(per_turbine, total, max_relative = 1e-12);

        let per_direction = r.aep_per_direction();
        assert_eq!(per_direction.len(), 2);
        assert_eq!(per_direction[1].0, 180.0);
        assert_relative_eq!(
            per_direction[0].1.get::<megawatt_hour>(),
            (0.3 * 1.5 + 0.2 * 5.0) * 8760.0,
            max_relative = 1e-12
        );

        let per_speed = r.aep_per_speed();
        assert_eq!(per_speed.iter().map(|s| s.0).collect::<Vec<_>>(), vec![8.0, 12.0]);
        let summed: f64 = per_speed.iter().map(|s| s.1.get::<megawatt_hour>()).sum();
        assert_relative_eq!(summed, total, max_relative = 1e-12);
    }

    #[test]
    fn test_capacity_factor() {
        let r = result();
        assert_relative_eq!(r.capacity_factor(), 2.69 / 6.0, max_relative = 1e-12);
    }

    #[test]
    fn test_accessors() {
        let r = result();
        assert_relative_eq!(r.total_weight(), 1.0, epsilon = 1e-12);
        assert_eq!(r.power(1, 1).map(|p| p.get::<megawatt>()), Some(2.0));
        assert!(r.effective_wind_speed(4, 0).is_none());
        assert!(r.summary().contains("AEP without wake loss"));
    }
}
