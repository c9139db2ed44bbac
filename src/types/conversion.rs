//! Planar layout coordinates are plain meters in `na::Point2<f64>`; these
//! helpers cross between them and `uom` lengths.

use nalgebra as na;
use uom::si::{f64::Length, length::meter};

#[inline]
pub fn to_coord(length: Length) -> f64 {
    length.get::<meter>()
}

#[inline]
pub fn from_coord(meters: f64) -> Length {
    Length::new::<meter>(meters)
}

/// Easting/northing lengths as a layout point
pub fn point_from_lengths(easting: Length, northing: Length) -> na::Point2<f64> {
    na::Point2::new(to_coord(easting), to_coord(northing))
}

pub fn x_length(point: &na::Point2<f64>) -> Length {
    from_coord(point.x)
}

pub fn y_length(point: &na::Point2<f64>) -> Length {
    from_coord(point.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip() {
        let p = point_from_lengths(Length::new::<meter>(630.0), Length::new::<meter>(-120.5));
        assert_eq!(p, na::Point2::new(630.0, -120.5));
        assert_eq!(x_length(&p).get::<meter>(), 630.0);
        assert_eq!(y_length(&p).get::<meter>(), -120.5);
    }
}
