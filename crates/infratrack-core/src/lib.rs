//! InfraTrack Core - network model, geodesy and format importers
//!
//! This crate turns survey, CAD and GIS files describing water and sewage
//! networks into one normalized [`Network`] of segments and point assets.

pub mod classify;
pub mod config;
pub mod error;
pub mod formats;
pub mod geo;
pub mod insights;
pub mod models;
pub mod ports;
pub mod schema;

pub use crate::geo::{distance_meters, CoordinateNormalizer, UtmZone};
pub use error::{InfraTrackError, Result};
pub use formats::{FormatImporter, FormatRegistry, ImportContext, ImportOutcome, ImportReport, TabularTarget};
pub use models::{
    Coordinate, ExecutionStatus, Network, NetworkContext, NetworkPoint, NetworkStats, NetworkType, PointKind,
    Segment,
};
