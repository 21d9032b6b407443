//! Network model: pipe segments, point assets and their execution state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::coordinate::Coordinate;
use crate::error::InfraTrackError;

/// Utility network a segment or point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Water,
    Sewage,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Water => write!(f, "WATER"),
            NetworkType::Sewage => write!(f, "SEWAGE"),
        }
    }
}

/// Network scope of an import: a single-network project or a mixed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkContext {
    Water,
    Sewage,
    #[default]
    Mixed,
}

impl NetworkContext {
    /// The network type this context forces, if it is strict
    pub fn strict_type(&self) -> Option<NetworkType> {
        match self {
            NetworkContext::Water => Some(NetworkType::Water),
            NetworkContext::Sewage => Some(NetworkType::Sewage),
            NetworkContext::Mixed => None,
        }
    }
}

impl From<NetworkType> for NetworkContext {
    fn from(t: NetworkType) -> Self {
        match t {
            NetworkType::Water => NetworkContext::Water,
            NetworkType::Sewage => NetworkContext::Sewage,
        }
    }
}

impl FromStr for NetworkContext {
    type Err = InfraTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "water" | "w" => Ok(NetworkContext::Water),
            "sewage" | "sewer" | "s" => Ok(NetworkContext::Sewage),
            "mixed" | "m" | "unknown" => Ok(NetworkContext::Mixed),
            _ => Err(InfraTrackError::ConfigInvalid {
                key: "network".to_string(),
                reason: format!("Invalid network: {}. Use water, sewage, or mixed", s),
            }),
        }
    }
}

impl fmt::Display for NetworkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkContext::Water => write!(f, "WATER"),
            NetworkContext::Sewage => write!(f, "SEWAGE"),
            NetworkContext::Mixed => write!(f, "MIXED"),
        }
    }
}

/// Closed set of point asset kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointKind {
    Manhole,
    InspectionChamber,
    OilTrap,
    SewageHouseConnection,
    Valve,
    AirValve,
    WashValve,
    FireHydrant,
    WaterHouseConnection,
    Elbow,
    Tee,
    Saddle,
    Reducer,
}

impl PointKind {
    pub const ALL: [PointKind; 13] = [
        PointKind::Manhole,
        PointKind::InspectionChamber,
        PointKind::OilTrap,
        PointKind::SewageHouseConnection,
        PointKind::Valve,
        PointKind::AirValve,
        PointKind::WashValve,
        PointKind::FireHydrant,
        PointKind::WaterHouseConnection,
        PointKind::Elbow,
        PointKind::Tee,
        PointKind::Saddle,
        PointKind::Reducer,
    ];

    /// Network this kind usually belongs to. Only a classification hint, never enforced.
    pub fn affinity(&self) -> NetworkType {
        match self {
            PointKind::Manhole
            | PointKind::InspectionChamber
            | PointKind::OilTrap
            | PointKind::SewageHouseConnection => NetworkType::Sewage,
            _ => NetworkType::Water,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PointKind::Manhole => "Manhole",
            PointKind::InspectionChamber => "Inspection Chamber",
            PointKind::OilTrap => "Oil Trap",
            PointKind::SewageHouseConnection => "Sewage House Connection",
            PointKind::Valve => "Valve",
            PointKind::AirValve => "Air Valve",
            PointKind::WashValve => "Wash Valve",
            PointKind::FireHydrant => "Fire Hydrant",
            PointKind::WaterHouseConnection => "Water House Connection",
            PointKind::Elbow => "Elbow",
            PointKind::Tee => "Tee",
            PointKind::Saddle => "Saddle",
            PointKind::Reducer => "Reducer",
        }
    }
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Execution progress of a network element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ExecutionStatus {
    /// Status implied by a completion percentage
    pub fn from_progress(percentage: u8) -> Self {
        match percentage {
            100.. => ExecutionStatus::Completed,
            0 => ExecutionStatus::Pending,
            _ => ExecutionStatus::InProgress,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "PENDING"),
            ExecutionStatus::InProgress => write!(f, "IN_PROGRESS"),
            ExecutionStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// A pipe run between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub network_type: NetworkType,
    pub status: ExecutionStatus,
    pub length_meters: f64,
    pub start_node: Coordinate,
    pub end_node: Coordinate,
    pub completion_percentage: u8,
    pub contractor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Segment {
    /// A freshly imported segment: pending, nothing executed yet
    pub fn imported(
        id: impl Into<String>,
        name: impl Into<String>,
        network_type: NetworkType,
        start_node: Coordinate,
        end_node: Coordinate,
        length_meters: f64,
        contractor: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            network_type,
            status: ExecutionStatus::Pending,
            length_meters,
            start_node,
            end_node,
            completion_percentage: 0,
            contractor: contractor.into(),
            updated_by: None,
            updated_at: None,
        }
    }

    /// Record field progress. The status follows the percentage.
    pub fn record_progress(
        &mut self,
        percentage: u8,
        updated_by: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        let percentage = percentage.min(100);
        self.completion_percentage = percentage;
        self.status = ExecutionStatus::from_progress(percentage);
        self.updated_by = Some(updated_by.into());
        self.updated_at = Some(at);
    }

    /// Set the status directly. Completed and pending snap the percentage to 100 and 0.
    pub fn set_status(
        &mut self,
        status: ExecutionStatus,
        updated_by: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        match status {
            ExecutionStatus::Completed => self.completion_percentage = 100,
            ExecutionStatus::Pending => self.completion_percentage = 0,
            ExecutionStatus::InProgress => {}
        }
        self.updated_by = Some(updated_by.into());
        self.updated_at = Some(at);
    }
}

/// A point asset such as a manhole or a valve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPoint {
    pub id: String,
    pub name: String,
    pub kind: PointKind,
    pub status: ExecutionStatus,
    pub location: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NetworkPoint {
    pub fn imported(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: PointKind,
        location: Coordinate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            status: ExecutionStatus::Pending,
            location,
            updated_by: None,
            updated_at: None,
        }
    }

    pub fn set_status(
        &mut self,
        status: ExecutionStatus,
        updated_by: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.updated_by = Some(updated_by.into());
        self.updated_at = Some(at);
    }
}

/// Segments and points audited together. Connectivity is derived from
/// coordinate proximity, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub segments: Vec<Segment>,
    pub points: Vec<NetworkPoint>,
}

impl Network {
    pub fn new(segments: Vec<Segment>, points: Vec<NetworkPoint>) -> Self {
        Self { segments, points }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len() + self.points.len()
    }

    /// Append another import's elements after this network's
    pub fn merge(&mut self, other: Network) {
        self.segments.extend(other.segments);
        self.points.extend(other.points);
    }

    pub fn has_network_type(&self, network_type: NetworkType) -> bool {
        self.segments.iter().any(|s| s.network_type == network_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment::imported(
            "S1",
            "Pipe 1",
            NetworkType::Water,
            Coordinate::new(39.23, 21.60),
            Coordinate::new(39.231, 21.601),
            150.0,
            "Unknown",
        )
    }

    #[test]
    fn test_imported_segment_is_pending() {
        let s = segment();
        assert_eq!(s.status, ExecutionStatus::Pending);
        assert_eq!(s.completion_percentage, 0);
        assert!(s.updated_by.is_none());
    }

    #[test]
    fn test_record_progress_derives_status() {
        let mut s = segment();
        let now = Utc::now();

        s.record_progress(45, "site engineer", now);
        assert_eq!(s.status, ExecutionStatus::InProgress);
        assert_eq!(s.updated_by.as_deref(), Some("site engineer"));

        s.record_progress(250, "site engineer", now);
        assert_eq!(s.completion_percentage, 100);
        assert_eq!(s.status, ExecutionStatus::Completed);

        s.record_progress(0, "site engineer", now);
        assert_eq!(s.status, ExecutionStatus::Pending);
    }

    #[test]
    fn test_set_status_snaps_progress() {
        let mut s = segment();
        let now = Utc::now();
        s.record_progress(60, "a", now);

        s.set_status(ExecutionStatus::Completed, "b", now);
        assert_eq!(s.completion_percentage, 100);

        s.set_status(ExecutionStatus::InProgress, "b", now);
        assert_eq!(s.completion_percentage, 100);

        s.set_status(ExecutionStatus::Pending, "b", now);
        assert_eq!(s.completion_percentage, 0);
    }

    #[test]
    fn test_affinity_partition() {
        let sewage: Vec<_> = PointKind::ALL
            .iter()
            .filter(|k| k.affinity() == NetworkType::Sewage)
            .collect();
        assert_eq!(sewage.len(), 4);
        assert_eq!(PointKind::Valve.affinity(), NetworkType::Water);
    }

    #[test]
    fn test_network_context_parse() {
        assert_eq!("Water".parse::<NetworkContext>().unwrap(), NetworkContext::Water);
        assert_eq!("SEWAGE".parse::<NetworkContext>().unwrap(), NetworkContext::Sewage);
        assert_eq!("mixed".parse::<NetworkContext>().unwrap(), NetworkContext::Mixed);
        assert!("gas".parse::<NetworkContext>().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(segment()).unwrap();
        assert_eq!(json["networkType"], "WATER");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["startNode"]["x"], 39.23);
        assert!(json.get("updatedBy").is_none());
    }

    #[test]
    fn test_merge() {
        let mut a = Network::new(vec![segment()], vec![]);
        let b = Network::new(
            vec![],
            vec![NetworkPoint::imported("P1", "MH 1", PointKind::Manhole, Coordinate::new(39.23, 21.60))],
        );
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert!(a.has_network_type(NetworkType::Water));
        assert!(!a.has_network_type(NetworkType::Sewage));
    }
}
