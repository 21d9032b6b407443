//! Geodesy: surface distances and UTM reprojection

pub mod geodesy;
pub mod transform;

pub use geodesy::{distance_meters, midpoint, EARTH_RADIUS_M};
pub use transform::{CoordinateNormalizer, Hemisphere, ProjReprojector, Reprojector, UtmZone};
