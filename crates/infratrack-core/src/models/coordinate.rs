//! Planar coordinate pair shared by geographic and projected data.

use serde::{Deserialize, Serialize};

/// A coordinate pair.
///
/// Before normalization `x`/`y` may hold either longitude/latitude in degrees or
/// a UTM easting/northing in meters; nothing on the value says which. After an
/// importer has run, every stored coordinate is geographic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Longitude when the coordinate is geographic
    pub fn lon(&self) -> f64 {
        self.x
    }

    /// Latitude when the coordinate is geographic
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// True when both components are exactly zero, the value unresolved fields coerce to
    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Outside the geographic value range, so it can only be a projected pair
    pub fn looks_projected(&self) -> bool {
        self.x.abs() > 180.0 || self.y.abs() > 90.0
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(c: geo::Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(p: geo::Point<f64>) -> Self {
        Self { x: p.x(), y: p.y() }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord { x: c.x, y: c.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_projected() {
        assert!(!Coordinate::new(39.2, 21.6).looks_projected());
        assert!(!Coordinate::new(-180.0, -90.0).looks_projected());
        assert!(Coordinate::new(510_669.0, 2_423_087.0).looks_projected());
        assert!(Coordinate::new(45.0, 91.0).looks_projected());
    }

    #[test]
    fn test_geo_conversion() {
        let c = Coordinate::new(39.1, 21.5);
        let g: geo::Coord<f64> = c.into();
        assert_eq!(Coordinate::from(g), c);
        assert_eq!(Coordinate::from(geo::Point::new(1.0, 2.0)), Coordinate::new(1.0, 2.0));
    }
}
