//! Projection of a layout into the wind-aligned frame
//!
//! For a meteorological direction θ (wind coming FROM θ, clockwise from
//! north) the wind travels along `(-sin θ, -cos θ)` in easting/northing.
//! The rotation below maps a position to (downstream, crosswind) coordinates,
//! so a larger downstream coordinate means further along the wind.

use crate::layout::FarmLayout;
use crate::types::*;
use nalgebra as na;

/// Rotation from easting/northing into (downstream, crosswind)
///
/// Rows are the downstream and crosswind unit axes.
pub fn wind_frame_rotation(direction: WindDirection) -> na::Matrix2<f64> {
    let theta = direction.get::<radian>();
    let s = theta.sin();
    let c = theta.cos();

    na::Matrix2::new(
        -s, -c,
        c, -s,
    )
}

/// Downstream distance and lateral offset for one ordered turbine pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairGeometry {
    /// Positive when the second turbine is strictly downstream of the first
    pub downstream_distance: f64,
    pub lateral_offset: f64,
}

/// Full pairwise matrices, indexed `[upstream, downstream]`
#[derive(Debug, Clone)]
pub struct PairwiseGeometry {
    pub downstream_distance: na::DMatrix<f64>,
    pub lateral_offset: na::DMatrix<f64>,
}

/// Turbine coordinates in the wind frame for one direction
#[derive(Debug, Clone)]
pub struct ProjectedLayout {
    direction: f64,
    downstream: Vec<f64>,
    crosswind: Vec<f64>,
    order: Vec<usize>,
}

impl ProjectedLayout {
    /// Direction this projection was made for, degrees
    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn downstream_distance(&self, upstream: usize, downstream: usize) -> f64 {
        self.downstream[downstream] - self.downstream[upstream]
    }

    pub fn lateral_offset(&self, upstream: usize, downstream: usize) -> f64 {
        (self.crosswind[downstream] - self.crosswind[upstream]).abs()
    }

    pub fn pair(&self, upstream: usize, downstream: usize) -> PairGeometry {
        PairGeometry {
            downstream_distance: self.downstream_distance(upstream, downstream),
            lateral_offset: self.lateral_offset(upstream, downstream),
        }
    }

    /// Turbine indices sorted upstream to downstream
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn pairwise(&self) -> PairwiseGeometry {
        let n = self.downstream.len();
        PairwiseGeometry {
            downstream_distance: na::DMatrix::from_fn(n, n, |u, d| self.downstream_distance(u, d)),
            lateral_offset: na::DMatrix::from_fn(n, n, |u, d| self.lateral_offset(u, d)),
        }
    }
}

pub struct GeometryProjector;

impl GeometryProjector {
    /// Project positions (meters) for a wind direction
    ///
    /// `ids` break ties between turbines at the same downstream coordinate.
    pub fn project(positions: &[na::Point2<f64>], ids: &[u32], direction: WindDirection) -> ProjectedLayout {
        let rotation = wind_frame_rotation(direction);

        let (downstream, crosswind): (Vec<f64>, Vec<f64>) = positions
            .iter()
            .map(|p| {
                let local = rotation * p.coords;
                (local.x, local.y)
            })
            .unzip();

        let mut order: Vec<usize> = (0..positions.len()).collect();
        order.sort_by(|&a, &b| {
            downstream[a]
                .partial_cmp(&downstream[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ids[a].cmp(&ids[b]))
        });

        ProjectedLayout {
            direction: direction.get::<degree>(),
            downstream,
            crosswind,
            order,
        }
    }

    pub fn project_layout(layout: &FarmLayout, direction: WindDirection) -> ProjectedLayout {
        let positions: Vec<na::Point2<f64>> = layout.turbines().iter().map(|t| t.position).collect();
        let ids: Vec<u32> = layout.turbines().iter().map(|t| t.id).collect();
        Self::project(&positions, &ids, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn deg(value: f64) -> Angle {
        Angle::new::<degree>(value)
    }

    /// Clockwise (compass) rotation of a point about the origin
    fn rotate_compass(p: na::Point2<f64>, degrees: f64) -> na::Point2<f64> {
        let (s, c) = degrees.to_radians().sin_cos();
        na::Point2::new(c * p.x + s * p.y, -s * p.x + c * p.y)
    }

    #[test]
    fn test_west_wind_blows_east() {
        // Wind from 270° travels towards +x
        let positions = [na::Point2::new(0.0, 0.0), na::Point2::new(500.0, 0.0)];
        let projected = GeometryProjector::project(&positions, &[0, 1], deg(270.0));

        assert_relative_eq!(projected.downstream_distance(0, 1), 500.0, epsilon = 1e-9);
        assert_relative_eq!(projected.downstream_distance(1, 0), -500.0, epsilon = 1e-9);
        assert_relative_eq!(projected.lateral_offset(0, 1), 0.0, epsilon = 1e-9);
        assert_eq!(projected.order(), &[0, 1]);
    }

    #[test]
    fn test_north_wind_blows_south() {
        let positions = [na::Point2::new(0.0, 0.0), na::Point2::new(0.0, 800.0), na::Point2::new(300.0, 0.0)];
        let projected = GeometryProjector::project(&positions, &[0, 1, 2], deg(0.0));

        assert_relative_eq!(projected.downstream_distance(1, 0), 800.0, epsilon = 1e-9);
        assert_relative_eq!(projected.lateral_offset(1, 0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(projected.lateral_offset(0, 2), 300.0, epsilon = 1e-9);
        assert_relative_eq!(projected.downstream_distance(0, 2), 0.0, epsilon = 1e-9);

        // Turbine 1 is furthest upstream; 0 and 2 tie and fall back to id order
        assert_eq!(projected.order(), &[1, 0, 2]);
    }

    #[test]
    fn test_rotation_is_proper() {
        for d in [0.0, 33.0, 180.0, 271.5] {
            let r = wind_frame_rotation(deg(d));
            assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(r * r.transpose(), na::Matrix2::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotational_invariance() {
        let positions = [
            na::Point2::new(0.0, 0.0),
            na::Point2::new(820.0, 140.0),
            na::Point2::new(-300.0, 1210.0),
            na::Point2::new(1500.0, -640.0),
        ];
        let ids = [0, 1, 2, 3];
        let base = GeometryProjector::project(&positions, &ids, deg(200.0)).pairwise();

        let rotated: Vec<_> = positions.iter().map(|&p| rotate_compass(p, 47.0)).collect();
        let turned = GeometryProjector::project(&rotated, &ids, deg(247.0)).pairwise();

        assert_relative_eq!(base.downstream_distance, turned.downstream_distance, epsilon = 1e-8);
        assert_relative_eq!(base.lateral_offset, turned.lateral_offset, epsilon = 1e-8);
    }
}
