//! Surface distances between geographic coordinates

use geo::{Coord, Distance, HaversineMeasure, Point};

use crate::models::Coordinate;

/// Mean Earth radius used by every distance in the audit
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const EARTH: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_M);

/// Great-circle distance in meters between two geographic coordinates (haversine).
///
/// NaN inputs propagate to a NaN result.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    EARTH.distance(Point::from(Coord::from(a)), Point::from(Coord::from(b)))
}

/// Planar midpoint, good enough for pinning an issue on a map
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Degrees of latitude spanned by `meters` along a meridian
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

/// Degrees of longitude spanned by `meters` along the parallel at `lat`.
///
/// Clamped near the poles, where a parallel degenerates to a point.
pub fn meters_to_lon_degrees(meters: f64, lat: f64) -> f64 {
    let cos = lat.to_radians().cos().abs().max(1e-6);
    (meters / (EARTH_RADIUS_M * cos)).to_degrees().min(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_distance() {
        let a = Coordinate::new(39.23, 21.60);
        let b = Coordinate::new(39.231, 21.601);
        let d = distance_meters(a, b);
        assert!((d - 151.83).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111_194.9).abs() < 0.1);
    }

    #[test]
    fn test_nan_propagates() {
        let d = distance_meters(Coordinate::new(f64::NAN, 0.0), Coordinate::new(0.0, 0.0));
        assert!(d.is_nan());
    }

    #[test]
    fn test_antimeridian_is_short() {
        let d = distance_meters(Coordinate::new(179.999_999_5, 10.0), Coordinate::new(-179.999_999_5, 10.0));
        assert!((d - 0.1095).abs() < 0.001, "got {d}");
    }

    #[test]
    fn test_lon_padding_covers_distance() {
        let lat = 60.0;
        let pad = meters_to_lon_degrees(1.0, lat);
        let d = distance_meters(Coordinate::new(10.0, lat), Coordinate::new(10.0 + pad, lat));
        assert!(d >= 0.999);
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            x1 in -180.0f64..180.0, y1 in -90.0f64..90.0,
            x2 in -180.0f64..180.0, y2 in -90.0f64..90.0,
        ) {
            let a = Coordinate::new(x1, y1);
            let b = Coordinate::new(x2, y2);
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
            prop_assert!(ab >= 0.0);
        }

        #[test]
        fn prop_distance_to_self_is_zero(x in -180.0f64..180.0, y in -90.0f64..90.0) {
            let a = Coordinate::new(x, y);
            prop_assert_eq!(distance_meters(a, a), 0.0);
        }
    }
}
