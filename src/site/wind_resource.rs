//! Directional wind resource: per-sector Weibull distributions
//!
//! # Direction convention
//!
//! Directions are meteorological: degrees clockwise from north, naming the
//! direction the wind blows FROM. Sector `i` of `N` is centred on `i * 360/N`
//! and spans half a sector width to either side, so sector 0 covers north.

use crate::site::weibull::Weibull;
use crate::types::*;
use serde::{Deserialize, Serialize};

const FULL_CIRCLE: f64 = 360.0;

/// One direction sector of the resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    /// Occurrence probability, normalized across sectors
    pub frequency: f64,
    pub weibull: Weibull,
}

/// Power-law vertical profile `(h / h_ref)^alpha`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shear {
    pub reference_height: Length,
    pub exponent: f64,
}

impl Shear {
    pub fn new(reference_height: Length, exponent: f64) -> Self {
        Self {
            reference_height,
            exponent,
        }
    }

    /// Multiplicative speed correction at `height`
    pub fn factor(&self, height: Length) -> f64 {
        (height.get::<meter>() / self.reference_height.get::<meter>()).powf(self.exponent)
    }
}

/// A discretized (direction, speed) sample with its share of probability mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowCase {
    /// Degrees clockwise from north, in [0, 360)
    pub direction: f64,
    /// m/s at the resource reference height
    pub wind_speed: f64,
    pub weight: f64,
}

impl FlowCase {
    pub fn direction_angle(&self) -> WindDirection {
        Angle::new::<degree>(self.direction)
    }

    pub fn wind_speed_velocity(&self) -> WindSpeed {
        Velocity::new::<meter_per_second>(self.wind_speed)
    }
}

/// Per-sector summary for wind-rose consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectorSample {
    pub index: usize,
    /// Sector centre, degrees
    pub center: f64,
    pub frequency: f64,
    pub scale: f64,
    pub shape: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Resource needs at least one sector")]
    NoSectors,

    #[error("Sector parameter count mismatch: {frequencies} frequencies, {scales} scales, {shapes} shapes")]
    CountMismatch {
        frequencies: usize,
        scales: usize,
        shapes: usize,
    },

    #[error("Sector {sector}: invalid frequency {value}")]
    InvalidFrequency { sector: usize, value: f64 },

    #[error("Sector frequencies sum to zero")]
    ZeroFrequencySum,

    #[error("Sector {sector}: invalid Weibull parameters A={scale}, k={shape}")]
    InvalidWeibull {
        sector: usize,
        scale: f64,
        shape: f64,
    },

    #[error("Turbulence intensity must be non-negative, got {0}")]
    InvalidTurbulenceIntensity(f64),

    #[error("Invalid shear profile: reference height {reference_height}, exponent {exponent}")]
    InvalidShear {
        reference_height: DisplayLength,
        exponent: f64,
    },

    #[error("Empty {0} grid")]
    EmptyGrid(&'static str),

    #[error("Wind speeds must be finite, non-negative and strictly increasing (at {0} m/s)")]
    InvalidSpeedGrid(f64),

    #[error("Directions must be finite and distinct after wrapping to [0, 360) (at {0}°)")]
    InvalidDirectionGrid(f64),
}

/// Directional Weibull wind climate
#[derive(Debug, Clone)]
pub struct WindResourceModel {
    sectors: Vec<Sector>,
    turbulence_intensity: f64,
    shear: Option<Shear>,
}

impl WindResourceModel {
    /// Ambient turbulence intensity used when none is given
    pub const DEFAULT_TURBULENCE_INTENSITY: f64 = 0.1;

    /// Build a resource from per-sector frequency, Weibull A (m/s) and k
    ///
    /// Frequencies may be given in any non-negative scale (percent, counts);
    /// they are renormalized to sum to 1.
    pub fn new(frequencies: &[f64], scales: &[f64], shapes: &[f64]) -> Result<Self, ResourceError> {
        if frequencies.len() != scales.len() || frequencies.len() != shapes.len() {
            return Err(ResourceError::CountMismatch {
                frequencies: frequencies.len(),
                scales: scales.len(),
                shapes: shapes.len(),
            });
        }
        if frequencies.is_empty() {
            return Err(ResourceError::NoSectors);
        }

        for (sector, &value) in frequencies.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ResourceError::InvalidFrequency { sector, value });
            }
        }

        let total: f64 = frequencies.iter().sum();
        if total <= 0.0 {
            return Err(ResourceError::ZeroFrequencySum);
        }
        if (total - 1.0).abs() > 1e-9 {
            tracing::warn!(
                "Sector frequencies sum to {:.6}, renormalizing to 1",
                total
            );
        }

        let sectors = frequencies
            .iter()
            .zip(scales.iter().zip(shapes))
            .enumerate()
            .map(|(sector, (&frequency, (&scale, &shape)))| {
                let weibull = Weibull::new(scale, shape);
                if !weibull.is_valid() {
                    return Err(ResourceError::InvalidWeibull { sector, scale, shape });
                }
                Ok(Sector {
                    frequency: frequency / total,
                    weibull,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Wind resource built with {} sectors", sectors.len());

        Ok(Self {
            sectors,
            turbulence_intensity: Self::DEFAULT_TURBULENCE_INTENSITY,
            shear: None,
        })
    }

    pub fn with_turbulence_intensity(mut self, ti: f64) -> Result<Self, ResourceError> {
        if !ti.is_finite() || ti < 0.0 {
            return Err(ResourceError::InvalidTurbulenceIntensity(ti));
        }
        self.turbulence_intensity = ti;
        Ok(self)
    }

    pub fn with_shear(mut self, shear: Shear) -> Result<Self, ResourceError> {
        let h_ref = shear.reference_height.get::<meter>();
        if !h_ref.is_finite() || h_ref <= 0.0 || !shear.exponent.is_finite() {
            return Err(ResourceError::InvalidShear {
                reference_height: DisplayLength(shear.reference_height),
                exponent: shear.exponent,
            });
        }
        self.shear = Some(shear);
        Ok(self)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Sector width in degrees
    pub fn sector_width(&self) -> f64 {
        FULL_CIRCLE / self.sectors.len() as f64
    }

    /// Sector centre in degrees
    pub fn sector_center(&self, index: usize) -> f64 {
        index as f64 * self.sector_width()
    }

    /// Index of the sector enclosing `direction` (degrees)
    pub fn sector_index(&self, direction: f64) -> usize {
        let width = self.sector_width();
        let shifted = (direction + width / 2.0).rem_euclid(FULL_CIRCLE);
        ((shifted / width) as usize).min(self.sectors.len() - 1)
    }

    pub fn sector_frequency_sum(&self) -> f64 {
        self.sectors.iter().map(|s| s.frequency).sum()
    }

    pub fn turbulence_intensity(&self) -> f64 {
        self.turbulence_intensity
    }

    pub fn shear(&self) -> Option<Shear> {
        self.shear
    }

    /// Free-stream speed multiplier at `height` (1 without shear)
    pub fn height_correction(&self, height: Length) -> f64 {
        self.shear.map_or(1.0, |s| s.factor(height))
    }

    /// Sector frequency times Weibull density, per m/s
    pub fn probability_density(&self, direction: WindDirection, wind_speed: WindSpeed) -> f64 {
        let sector = &self.sectors[self.sector_index(direction.get::<degree>())];
        sector.frequency * sector.weibull.pdf(wind_speed.get::<meter_per_second>())
    }

    /// Discretize the resource into weighted flow cases
    ///
    /// Each requested direction owns the arc between the midpoints to its
    /// neighbours on the circle; each requested speed owns the interval between
    /// midpoints to its neighbours, with the lowest bin extended down to 0 and
    /// the highest up to infinity. The weight of a case is the exact resource
    /// probability of its (arc, interval) cell, so weights sum to 1.
    ///
    /// Cases are ordered by ascending direction (wrapped to [0, 360)), then
    /// ascending speed.
    pub fn integrate_over(
        &self,
        direction_bins: &[WindDirection],
        speed_bins: &[WindSpeed],
    ) -> Result<Vec<FlowCase>, ResourceError> {
        let directions = direction_arcs(direction_bins)?;
        let speeds = speed_intervals(speed_bins)?;
        let width = self.sector_width();

        let mut cases = Vec::with_capacity(directions.len() * speeds.len());
        for &(direction, lo, hi) in &directions {
            // Share of each sector's direction mass falling in this arc
            let shares: Vec<(usize, f64)> = (0..self.sectors.len())
                .filter_map(|s| {
                    let overlap = circular_overlap(lo, hi, self.sector_center(s), width);
                    (overlap > 0.0).then_some((s, overlap / width))
                })
                .collect();

            for &(wind_speed, v_lo, v_hi) in &speeds {
                let weight = shares
                    .iter()
                    .map(|&(s, share)| {
                        let sector = &self.sectors[s];
                        share * sector.frequency * sector.weibull.mass_between(v_lo, v_hi)
                    })
                    .sum();
                cases.push(FlowCase {
                    direction,
                    wind_speed,
                    weight,
                });
            }
        }

        Ok(cases)
    }

    /// Per-sector frequency and Weibull parameters
    pub fn sector_distribution(&self) -> Vec<SectorSample> {
        self.sectors
            .iter()
            .enumerate()
            .map(|(index, sector)| SectorSample {
                index,
                center: self.sector_center(index),
                frequency: sector.frequency,
                scale: sector.weibull.scale,
                shape: sector.weibull.shape,
            })
            .collect()
    }

    /// `(speed, frequency * density)` samples for one sector
    pub fn speed_distribution(&self, sector: usize, speeds: &[f64]) -> Option<Vec<(f64, f64)>> {
        let sector = self.sectors.get(sector)?;
        Some(
            speeds
                .iter()
                .map(|&v| (v, sector.frequency * sector.weibull.pdf(v)))
                .collect(),
        )
    }
}

/// Sorted directions in [0, 360) with the arc (lo, hi) each one owns
fn direction_arcs(bins: &[WindDirection]) -> Result<Vec<(f64, f64, f64)>, ResourceError> {
    if bins.is_empty() {
        return Err(ResourceError::EmptyGrid("direction"));
    }

    let mut degrees = Vec::with_capacity(bins.len());
    for bin in bins {
        let d = bin.get::<degree>();
        if !d.is_finite() {
            return Err(ResourceError::InvalidDirectionGrid(d));
        }
        degrees.push(d.rem_euclid(FULL_CIRCLE));
    }
    degrees.sort_by(f64::total_cmp);

    for pair in degrees.windows(2) {
        if pair[1] - pair[0] < 1e-9 {
            return Err(ResourceError::InvalidDirectionGrid(pair[1]));
        }
    }

    let n = degrees.len();
    if n == 1 {
        let d = degrees[0];
        return Ok(vec![(d, d - FULL_CIRCLE / 2.0, d + FULL_CIRCLE / 2.0)]);
    }

    // Gap from each direction to the next one around the circle
    let gaps: Vec<f64> = (0..n)
        .map(|i| {
            if i + 1 < n {
                degrees[i + 1] - degrees[i]
            } else {
                degrees[0] + FULL_CIRCLE - degrees[i]
            }
        })
        .collect();

    Ok((0..n)
        .map(|i| {
            let previous_gap = gaps[(i + n - 1) % n];
            (degrees[i], degrees[i] - previous_gap / 2.0, degrees[i] + gaps[i] / 2.0)
        })
        .collect())
}

/// Speeds with the interval (lo, hi) each one owns, covering [0, inf)
fn speed_intervals(bins: &[WindSpeed]) -> Result<Vec<(f64, f64, f64)>, ResourceError> {
    if bins.is_empty() {
        return Err(ResourceError::EmptyGrid("wind speed"));
    }

    let speeds: Vec<f64> = bins.iter().map(|v| v.get::<meter_per_second>()).collect();
    for (i, &v) in speeds.iter().enumerate() {
        if !v.is_finite() || v < 0.0 || (i > 0 && v <= speeds[i - 1]) {
            return Err(ResourceError::InvalidSpeedGrid(v));
        }
    }

    let n = speeds.len();
    Ok((0..n)
        .map(|i| {
            let lo = if i == 0 { 0.0 } else { (speeds[i - 1] + speeds[i]) / 2.0 };
            let hi = if i + 1 == n {
                f64::INFINITY
            } else {
                (speeds[i] + speeds[i + 1]) / 2.0
            };
            (speeds[i], lo, hi)
        })
        .collect())
}

/// Overlap in degrees between arc [lo, hi) and the sector centred on `center`
fn circular_overlap(lo: f64, hi: f64, center: f64, width: f64) -> f64 {
    [-FULL_CIRCLE, 0.0, FULL_CIRCLE]
        .iter()
        .map(|shift| {
            let a = center - width / 2.0 + shift;
            let b = center + width / 2.0 + shift;
            (hi.min(b) - lo.max(a)).max(0.0)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn north_sea_resource() -> WindResourceModel {
        WindResourceModel::new(
            &[6.0, 4.0, 5.0, 7.0, 5.0, 8.0, 10.0, 13.0, 16.0, 11.0, 8.0, 7.0],
            &[9.74, 8.58, 9.03, 10.06, 9.08, 10.50, 11.65, 13.18, 13.08, 11.95, 10.04, 10.25],
            &[2.557, 2.279, 2.607, 2.232, 2.037, 2.506, 2.068, 2.428, 2.760, 2.256, 2.471, 2.182],
        )
        .unwrap()
    }

    fn degrees(values: impl IntoIterator<Item = f64>) -> Vec<Angle> {
        values.into_iter().map(Angle::new::<degree>).collect()
    }

    fn speeds(values: impl IntoIterator<Item = f64>) -> Vec<Velocity> {
        values.into_iter().map(Velocity::new::<meter_per_second>).collect()
    }

    #[test]
    fn test_frequencies_renormalized() {
        let resource = north_sea_resource();
        assert_relative_eq!(resource.sector_frequency_sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(resource.sectors()[8].frequency, 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_sector_lookup() {
        let resource = north_sea_resource();
        assert_relative_eq!(resource.sector_width(), 30.0);
        assert_eq!(resource.sector_index(0.0), 0);
        assert_eq!(resource.sector_index(14.9), 0);
        assert_eq!(resource.sector_index(15.0), 1);
        assert_eq!(resource.sector_index(350.0), 0);
        assert_eq!(resource.sector_index(-20.0), 11);
        assert_eq!(resource.sector_index(270.0), 9);
        assert_eq!(resource.sector_index(720.0), 0);
    }

    #[test]
    fn test_probability_density() {
        let resource = north_sea_resource();
        let density = resource.probability_density(
            Angle::new::<degree>(240.0),
            Velocity::new::<meter_per_second>(10.0),
        );
        let expected = 0.16 * Weibull::new(13.08, 2.760).pdf(10.0);
        assert_relative_eq!(density, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_integrate_weights_partition_probability() {
        let resource = north_sea_resource();
        let cases = resource
            .integrate_over(
                &degrees((0..360).map(f64::from)),
                &speeds((3..=25).map(f64::from)),
            )
            .unwrap();

        assert_eq!(cases.len(), 360 * 23);
        let total: f64 = cases.iter().map(|c| c.weight).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        assert!(cases.iter().all(|c| c.weight >= 0.0));
    }

    #[test]
    fn test_integrate_irregular_grid_still_sums_to_one() {
        let resource = north_sea_resource();
        let cases = resource
            .integrate_over(&degrees([350.0, 10.0, 95.0, 200.0]), &speeds([4.0, 7.5, 18.0]))
            .unwrap();

        let total: f64 = cases.iter().map(|c| c.weight).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);

        // Sorted by direction then speed
        assert_relative_eq!(cases[0].direction, 10.0);
        assert_relative_eq!(cases[0].wind_speed, 4.0);
        assert_relative_eq!(cases[11].direction, 350.0);
        assert_relative_eq!(cases[11].wind_speed, 18.0);
    }

    #[test]
    fn test_sector_centre_grid_matches_sector_frequencies() {
        let resource = north_sea_resource();
        let centres: Vec<f64> = (0..12).map(|i| resource.sector_center(i)).collect();
        let cases = resource
            .integrate_over(&degrees(centres), &speeds([10.0]))
            .unwrap();

        for (case, sector) in cases.iter().zip(resource.sectors()) {
            assert_relative_eq!(case.weight, sector.frequency, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_grids() {
        let resource = north_sea_resource();
        assert!(matches!(
            resource.integrate_over(&[], &speeds([5.0])),
            Err(ResourceError::EmptyGrid("direction"))
        ));
        assert!(matches!(
            resource.integrate_over(&degrees([0.0]), &speeds([5.0, 5.0])),
            Err(ResourceError::InvalidSpeedGrid(_))
        ));
        assert!(matches!(
            resource.integrate_over(&degrees([0.0, 360.0]), &speeds([5.0])),
            Err(ResourceError::InvalidDirectionGrid(_))
        ));
    }

    #[test]
    fn test_invalid_resources() {
        assert!(matches!(
            WindResourceModel::new(&[1.0, 1.0], &[9.0], &[2.0, 2.0]),
            Err(ResourceError::CountMismatch { .. })
        ));
        assert!(matches!(
            WindResourceModel::new(&[0.0, 0.0], &[9.0, 9.0], &[2.0, 2.0]),
            Err(ResourceError::ZeroFrequencySum)
        ));
        assert!(matches!(
            WindResourceModel::new(&[1.0], &[9.0], &[0.0]),
            Err(ResourceError::InvalidWeibull { sector: 0, .. })
        ));
        assert!(matches!(
            WindResourceModel::new(&[], &[], &[]),
            Err(ResourceError::NoSectors)
        ));
    }

    #[test]
    fn test_shear_and_turbulence() {
        let resource = north_sea_resource()
            .with_turbulence_intensity(0.06)
            .unwrap()
            .with_shear(Shear::new(Length::new::<meter>(100.0), 0.12))
            .unwrap();

        assert_relative_eq!(resource.turbulence_intensity(), 0.06);
        assert_relative_eq!(resource.height_correction(Length::new::<meter>(100.0)), 1.0);
        assert_relative_eq!(
            resource.height_correction(Length::new::<meter>(116.0)),
            1.16f64.powf(0.12),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            north_sea_resource().height_correction(Length::new::<meter>(116.0)),
            1.0
        );
        assert!(north_sea_resource().with_turbulence_intensity(-0.1).is_err());
    }

    #[test]
    fn test_distribution_samples() {
        let resource = north_sea_resource();
        let samples = resource.sector_distribution();
        assert_eq!(samples.len(), 12);
        assert_relative_eq!(samples[3].center, 90.0);
        assert_relative_eq!(samples[3].scale, 10.06);

        let densities = resource.speed_distribution(8, &[0.0, 10.0]).unwrap();
        assert_eq!(densities[0], (0.0, 0.0));
        assert!(densities[1].1 > 0.0);
        assert!(resource.speed_distribution(12, &[5.0]).is_none());
    }
}
