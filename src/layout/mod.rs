//! Farm layout: turbine positions and their catalog assignments
//!
//! Positions are planar, relative, in meters: X is easting, Y is northing.

use crate::turbine::{TurbineCatalog, TurbineModel};
use crate::types::*;
use nalgebra as na;

/// Positions closer than this are treated as coincident (meters)
pub const COINCIDENT_TOLERANCE: f64 = 1e-6;

/// A placed turbine
#[derive(Debug, Clone, PartialEq)]
pub struct Turbine {
    pub id: u32,
    /// Easting/northing in meters
    pub position: na::Point2<f64>,
    /// Overrides the model hub height when set
    pub height: Option<Length>,
    /// Index into the [`TurbineCatalog`]
    pub model: usize,
}

impl Turbine {
    pub fn new(id: u32, x: Length, y: Length, model: usize) -> Self {
        Self {
            id,
            position: point_from_lengths(x, y),
            height: None,
            model,
        }
    }

    pub fn with_height(mut self, height: Length) -> Self {
        self.height = Some(height);
        self
    }

    /// Hub height, falling back to the model's
    pub fn hub_height(&self, model: &TurbineModel) -> Length {
        self.height.unwrap_or(model.hub_height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Turbines {first} and {second} share the same position ({x}, {y})")]
    GeometryDegenerate {
        first: u32,
        second: u32,
        x: DisplayLength,
        y: DisplayLength,
    },

    #[error("Duplicate turbine id {0}")]
    DuplicateId(u32),

    #[error("Turbine {id} references unknown model index {model}")]
    UnknownModel { id: u32, model: usize },

    #[error("Turbine {id} has invalid position or height")]
    InvalidCoordinate { id: u32 },

    #[error("Coordinate count mismatch: {xs} x values, {ys} y values")]
    CoordinateMismatch { xs: usize, ys: usize },

    #[error("Layout has no turbines")]
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct FarmLayout {
    turbines: Vec<Turbine>,
}

impl FarmLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout from parallel coordinate lists (meters), all of one model
    ///
    /// Ids are assigned from 0 in input order.
    pub fn from_coordinates(xs: &[f64], ys: &[f64], model: usize) -> Result<Self, LayoutError> {
        if xs.len() != ys.len() {
            return Err(LayoutError::CoordinateMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        let turbines = xs
            .iter()
            .zip(ys)
            .enumerate()
            .map(|(i, (&x, &y))| Turbine::new(i as u32, from_coord(x), from_coord(y), model))
            .collect();
        Ok(Self { turbines })
    }

    /// Append a group of turbines of another model, continuing the id sequence
    pub fn extend_with(&mut self, xs: &[f64], ys: &[f64], model: usize) -> Result<(), LayoutError> {
        let next_id = self.turbines.iter().map(|t| t.id + 1).max().unwrap_or(0);
        let group = Self::from_coordinates(xs, ys, model)?;
        self.turbines.extend(group.turbines.into_iter().map(|mut t| {
            t.id += next_id;
            t
        }));
        Ok(())
    }

    pub fn push(&mut self, turbine: Turbine) {
        self.turbines.push(turbine);
    }

    pub fn turbines(&self) -> &[Turbine] {
        &self.turbines
    }

    pub fn len(&self) -> usize {
        self.turbines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty()
    }

    /// Check ids, model references and positions against a catalog
    pub fn validate(&self, catalog: &TurbineCatalog) -> Result<(), LayoutError> {
        if self.turbines.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut ids = std::collections::HashSet::with_capacity(self.turbines.len());
        for turbine in &self.turbines {
            if !ids.insert(turbine.id) {
                return Err(LayoutError::DuplicateId(turbine.id));
            }
            if catalog.get(turbine.model).is_none() {
                return Err(LayoutError::UnknownModel {
                    id: turbine.id,
                    model: turbine.model,
                });
            }
            let height_ok = turbine
                .height
                .is_none_or(|h| h.get::<meter>().is_finite() && h.get::<meter>() > 0.0);
            if !turbine.position.x.is_finite() || !turbine.position.y.is_finite() || !height_ok {
                return Err(LayoutError::InvalidCoordinate { id: turbine.id });
            }
        }

        self.check_coincident()
    }

    /// Reject two turbines at the same planar position
    fn check_coincident(&self) -> Result<(), LayoutError> {
        let mut order: Vec<usize> = (0..self.turbines.len()).collect();
        order.sort_by(|&a, &b| {
            let pa = self.turbines[a].position;
            let pb = self.turbines[b].position;
            pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
        });

        // Only neighbours within tolerance in x can coincide
        for (k, &a) in order.iter().enumerate() {
            let pa = self.turbines[a].position;
            for &b in &order[k + 1..] {
                let pb = self.turbines[b].position;
                if pb.x - pa.x > COINCIDENT_TOLERANCE {
                    break;
                }
                if (pb - pa).norm() <= COINCIDENT_TOLERANCE {
                    let (first, second) = if self.turbines[a].id < self.turbines[b].id {
                        (self.turbines[a].id, self.turbines[b].id)
                    } else {
                        (self.turbines[b].id, self.turbines[a].id)
                    };
                    return Err(LayoutError::GeometryDegenerate {
                        first,
                        second,
                        x: DisplayLength(x_length(&pa)),
                        y: DisplayLength(y_length(&pa)),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turbine::{Interpolation, PowerThrustCurve};

    fn catalog() -> TurbineCatalog {
        let curve = PowerThrustCurve::from_tabular(
            &[4.0, 12.0, 25.0],
            &[0.0, 5.0, 5.0],
            "MW",
            &[0.8, 0.5, 0.1],
            Interpolation::Linear,
        )
        .unwrap();
        let mut catalog = TurbineCatalog::new();
        catalog
            .add_model(
                TurbineModel::new(
                    "test",
                    Length::new::<meter>(126.0),
                    Length::new::<meter>(90.0),
                    curve,
                )
                .unwrap(),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_valid_layout() {
        let layout = FarmLayout::from_coordinates(&[0.0, 630.0, 1260.0], &[0.0, 0.0, 0.0], 0).unwrap();
        assert_eq!(layout.len(), 3);
        assert!(layout.validate(&catalog()).is_ok());
        assert_eq!(layout.turbines()[2].id, 2);
    }

    #[test]
    fn test_coincident_turbines_rejected() {
        let layout =
            FarmLayout::from_coordinates(&[0.0, 500.0, 1000.0, 500.0], &[0.0, 200.0, 0.0, 200.0], 0)
                .unwrap();
        match layout.validate(&catalog()) {
            Err(LayoutError::GeometryDegenerate { first, second, .. }) => {
                assert_eq!((first, second), (1, 3));
            }
            other => panic!("expected degenerate geometry, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_model_and_duplicate_id() {
        let layout = FarmLayout::from_coordinates(&[0.0], &[0.0], 3).unwrap();
        assert!(matches!(
            layout.validate(&catalog()),
            Err(LayoutError::UnknownModel { id: 0, model: 3 })
        ));

        let mut layout = FarmLayout::new();
        layout.push(Turbine::new(7, Length::new::<meter>(0.0), Length::new::<meter>(0.0), 0));
        layout.push(Turbine::new(7, Length::new::<meter>(900.0), Length::new::<meter>(0.0), 0));
        assert!(matches!(
            layout.validate(&catalog()),
            Err(LayoutError::DuplicateId(7))
        ));

        assert!(matches!(FarmLayout::new().validate(&catalog()), Err(LayoutError::Empty)));
    }

    #[test]
    fn test_extend_with_continues_ids() {
        let mut layout = FarmLayout::from_coordinates(&[0.0, 800.0], &[0.0, 0.0], 0).unwrap();
        layout.extend_with(&[0.0, 800.0], &[900.0, 900.0], 0).unwrap();
        let ids: Vec<u32> = layout.turbines().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        assert!(matches!(
            layout.extend_with(&[1.0, 2.0], &[1.0], 0),
            Err(LayoutError::CoordinateMismatch { xs: 2, ys: 1 })
        ));
    }

    #[test]
    fn test_hub_height_override() {
        let catalog = catalog();
        let model = catalog.get(0).unwrap();
        let t = Turbine::new(0, Length::new::<meter>(0.0), Length::new::<meter>(0.0), 0);
        assert_eq!(t.hub_height(model).get::<meter>(), 90.0);
        let t = t.with_height(Length::new::<meter>(110.0));
        assert_eq!(t.hub_height(model).get::<meter>(), 110.0);
    }
}
