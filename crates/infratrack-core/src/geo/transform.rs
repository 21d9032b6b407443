//! Projected (UTM) to geographic reprojection

use crate::error::{InfraTrackError, Result};
use crate::models::Coordinate;
use proj::Proj;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_EASTING: f64 = 1_000_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::North => write!(f, "north"),
            Hemisphere::South => write!(f, "south"),
        }
    }
}

/// A UTM zone on the WGS84 datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    pub const fn new(number: u8, hemisphere: Hemisphere) -> Self {
        Self { number, hemisphere }
    }

    /// Longitude of the zone's central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    /// EPSG code of the matching WGS84 / UTM projected CRS
    pub fn epsg(&self) -> u32 {
        match self.hemisphere {
            Hemisphere::North => 32600 + u32::from(self.number),
            Hemisphere::South => 32700 + u32::from(self.number),
        }
    }
}

impl Default for UtmZone {
    fn default() -> Self {
        Self::new(37, Hemisphere::North)
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.hemisphere {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        };
        write!(f, "UTM {}{} (EPSG:{})", self.number, h, self.epsg())
    }
}

/// Turns a projected easting/northing into geographic degrees
pub trait Reprojector {
    fn to_geographic(&self, x: f64, y: f64) -> Result<Coordinate>;
}

/// PROJ-backed reprojection from a UTM zone to WGS84 (EPSG:4326)
pub struct ProjReprojector {
    zone: UtmZone,
    proj: Proj,
}

impl ProjReprojector {
    pub fn new(zone: UtmZone) -> Result<Self> {
        let from = format!("EPSG:{}", zone.epsg());
        let proj = Proj::new_known_crs(&from, "EPSG:4326", None).map_err(|e| {
            InfraTrackError::ConfigInvalid {
                key: "utm_zone".to_string(),
                reason: format!("Failed to create projection from {} to EPSG:4326: {}", from, e),
            }
        })?;
        Ok(Self { zone, proj })
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }
}

impl Reprojector for ProjReprojector {
    fn to_geographic(&self, x: f64, y: f64) -> Result<Coordinate> {
        let fail = |reason: String| InfraTrackError::Projection { x, y, reason };

        if !x.is_finite() || !y.is_finite() {
            return Err(fail("non-finite input".to_string()));
        }
        if !(0.0..=MAX_EASTING).contains(&x) || !(0.0..=FALSE_NORTHING_SOUTH).contains(&y) {
            return Err(fail(format!("outside the valid range of {}", self.zone)));
        }

        let (lon, lat) = self.proj.convert((x, y)).map_err(|e| fail(e.to_string()))?;
        let result = Coordinate::new(lon, lat);
        if !result.is_finite() || result.looks_projected() {
            return Err(fail("projection produced an out-of-range coordinate".to_string()));
        }
        Ok(result)
    }
}

/// Applies the magnitude heuristic: anything outside ±180/±90 is taken as
/// projected and reprojected, everything else passes through untouched.
pub struct CoordinateNormalizer {
    reprojector: Box<dyn Reprojector>,
}

impl CoordinateNormalizer {
    pub fn new(reprojector: Box<dyn Reprojector>) -> Self {
        Self { reprojector }
    }

    /// Normalizer reprojecting through PROJ from `zone`
    pub fn for_zone(zone: UtmZone) -> Result<Self> {
        Ok(Self::new(Box::new(ProjReprojector::new(zone)?)))
    }

    /// Geographic degrees for the pair. A failed reprojection yields the raw pair.
    pub fn normalize(&self, x: f64, y: f64) -> Coordinate {
        let raw = Coordinate::new(x, y);
        if !raw.looks_projected() {
            return raw;
        }
        match self.reprojector.to_geographic(x, y) {
            Ok(c) if c.is_finite() => c,
            Ok(_) => {
                tracing::warn!(x, y, "Reprojection produced non-finite output, keeping raw pair");
                raw
            }
            Err(e) => {
                tracing::warn!("{}, keeping raw pair", e);
                raw
            }
        }
    }
}
