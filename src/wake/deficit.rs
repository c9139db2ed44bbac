//! Top-hat (Jensen / N.O. Jensen) wake deficit
//!
//! The wake behind a rotor of radius `R` expands linearly,
//! `R_w = R + k x`, and carries a uniform fractional deficit
//!
//! ```text
//! deficit = (1 - sqrt(1 - Ct)) * (R / R_w)^2 * overlap
//! ```
//!
//! `overlap` is either a containment test on the downstream rotor centre or
//! the fraction of the downstream rotor disc covered by the wake disc, see
//! [`RotorOverlap`]. The common NOJ reference implementations scale by the
//! covered area, so compare against them with [`RotorOverlap::RotorArea`].

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Conventional offshore wake expansion coefficient
pub const DEFAULT_EXPANSION_K: f64 = 0.04;

/// How much of a downstream rotor a wake is considered to cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotorOverlap {
    /// Point turbine: full deficit when the rotor centre is inside the wake, else none
    #[default]
    RotorCenter,
    /// Fraction of the downstream swept area intersected by the wake disc
    RotorArea,
}

#[derive(Debug, thiserror::Error)]
pub enum WakeModelError {
    #[error("Wake expansion coefficient must be positive and finite, got {0}")]
    InvalidExpansion(f64),
}

/// Fractional wind-speed reduction caused by one upstream rotor
pub trait WakeDeficitModel: Send + Sync {
    /// Deficit at a point `distance` downstream and `lateral_offset` off the
    /// wake axis of a rotor of `rotor_diameter` operating at `thrust_coefficient`.
    ///
    /// Returns 0 for non-positive `distance`.
    fn deficit(
        &self,
        distance: f64,
        lateral_offset: f64,
        rotor_diameter: f64,
        thrust_coefficient: f64,
    ) -> f64;

    /// Deficit seen by a whole downstream rotor of `downstream_diameter`
    fn rotor_deficit(
        &self,
        distance: f64,
        lateral_offset: f64,
        rotor_diameter: f64,
        thrust_coefficient: f64,
        downstream_diameter: f64,
        overlap: RotorOverlap,
    ) -> f64;
}

/// Jensen wake model with a fixed expansion coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JensenDeficit {
    expansion_k: f64,
}

impl JensenDeficit {
    pub fn new(expansion_k: f64) -> Result<Self, WakeModelError> {
        if !expansion_k.is_finite() || expansion_k <= 0.0 {
            return Err(WakeModelError::InvalidExpansion(expansion_k));
        }
        Ok(Self { expansion_k })
    }

    pub fn expansion_k(&self) -> f64 {
        self.expansion_k
    }
}

impl Default for JensenDeficit {
    fn default() -> Self {
        Self {
            expansion_k: DEFAULT_EXPANSION_K,
        }
    }
}

impl WakeDeficitModel for JensenDeficit {
    fn deficit(
        &self,
        distance: f64,
        lateral_offset: f64,
        rotor_diameter: f64,
        thrust_coefficient: f64,
    ) -> f64 {
        jensen_deficit(distance, lateral_offset, rotor_diameter, thrust_coefficient, self.expansion_k)
    }

    fn rotor_deficit(
        &self,
        distance: f64,
        lateral_offset: f64,
        rotor_diameter: f64,
        thrust_coefficient: f64,
        downstream_diameter: f64,
        overlap: RotorOverlap,
    ) -> f64 {
        match overlap {
            RotorOverlap::RotorCenter => {
                self.deficit(distance, lateral_offset, rotor_diameter, thrust_coefficient)
            }
            RotorOverlap::RotorArea => {
                if distance <= 0.0 {
                    return 0.0;
                }
                let radius = rotor_diameter / 2.0;
                let wake = wake_radius(distance, rotor_diameter, self.expansion_k);
                let fraction = overlap_fraction(wake, downstream_diameter / 2.0, lateral_offset);
                centerline_deficit(radius, wake, thrust_coefficient) * fraction
            }
        }
    }
}

/// Wake radius `distance` downstream of a rotor
pub fn wake_radius(distance: f64, rotor_diameter: f64, expansion_k: f64) -> f64 {
    rotor_diameter / 2.0 + expansion_k * distance
}

/// Point-turbine Jensen deficit, in [0, 1]
///
/// The point is inside the wake when `lateral_offset <= wake radius`.
pub fn jensen_deficit(
    distance: f64,
    lateral_offset: f64,
    rotor_diameter: f64,
    thrust_coefficient: f64,
    expansion_k: f64,
) -> f64 {
    if distance <= 0.0 || rotor_diameter <= 0.0 {
        return 0.0;
    }
    let wake = wake_radius(distance, rotor_diameter, expansion_k);
    if lateral_offset.abs() > wake {
        return 0.0;
    }
    centerline_deficit(rotor_diameter / 2.0, wake, thrust_coefficient)
}

/// Deficit inside the top-hat wake; Ct is clamped to [0, 1]
fn centerline_deficit(rotor_radius: f64, wake_radius: f64, thrust_coefficient: f64) -> f64 {
    let ct = thrust_coefficient.clamp(0.0, 1.0);
    let induction = 1.0 - (1.0 - ct).sqrt();
    let ratio = rotor_radius / wake_radius;
    (induction * ratio * ratio).clamp(0.0, 1.0)
}

/// Fraction of a rotor disc (radius `rotor_radius`) covered by a wake disc
/// (radius `wake_radius`) whose centres are `offset` apart
pub fn overlap_fraction(wake_radius: f64, rotor_radius: f64, offset: f64) -> f64 {
    let d = offset.abs();
    let (big, small) = (wake_radius, rotor_radius);

    if rotor_radius <= 0.0 || d >= big + small {
        return 0.0;
    }
    if d <= (big - small).abs() {
        // One disc inside the other
        let inner = big.min(small);
        return (inner * inner) / (small * small);
    }

    let a1 = ((d * d + small * small - big * big) / (2.0 * d * small)).clamp(-1.0, 1.0).acos();
    let a2 = ((d * d + big * big - small * small) / (2.0 * d * big)).clamp(-1.0, 1.0).acos();
    let lens = (-d + small + big) * (d + small - big) * (d - small + big) * (d + small + big);
    let area = small * small * a1 + big * big * a2 - 0.5 * lens.max(0.0).sqrt();

    (area / (PI * small * small)).clamp(0.0, 1.0)
}
