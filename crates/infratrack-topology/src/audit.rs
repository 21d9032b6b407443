//! Engineering audit of an imported network
//!
//! Every check is advisory. The audit returns findings as data and never
//! fails for a well-formed [`Network`], empty ones included.

use std::fmt;

use infratrack_core::config::LayeredConfig;
use infratrack_core::geo::midpoint;
use infratrack_core::{distance_meters, Coordinate, Network, NetworkType, PointKind, Segment};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::index::{EndpointIndex, NodeOwner};

/// Distances, in meters, that drive the checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuditTolerances {
    /// Two nodes closer than this are connected
    pub coincidence_m: f64,
    /// Two locations closer than this are the same place
    pub degenerate_m: f64,
    /// Geodesic span past which a segment needs intermediate control points
    pub max_segment_length_m: f64,
    /// Declared lengths below this are treated as missing metadata
    pub min_declared_length_m: f64,
}

impl Default for AuditTolerances {
    fn default() -> Self {
        Self {
            coincidence_m: 1.0,
            degenerate_m: 0.1,
            max_segment_length_m: 2000.0,
            min_declared_length_m: 1.0,
        }
    }
}

impl AuditTolerances {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            coincidence_m: config.coincidence_tolerance_m.value,
            degenerate_m: config.degenerate_tolerance_m.value,
            max_segment_length_m: config.max_segment_length_m.value,
            ..Self::default()
        }
    }
}

/// Issue severity. The derived order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    SelfLoop,
    LengthMismatch,
    ExcessiveLength,
    OpenStart,
    OpenEnd,
    OrphanPoint,
    DuplicatePoint,
    SewageWithoutManholes,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::SelfLoop | IssueKind::DuplicatePoint | IssueKind::SewageWithoutManholes => {
                Severity::Error
            }
            IssueKind::LengthMismatch
            | IssueKind::ExcessiveLength
            | IssueKind::OpenStart
            | IssueKind::OpenEnd => Severity::Warning,
            IssueKind::OrphanPoint => Severity::Info,
        }
    }

    /// Prefix of the issue id
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::SelfLoop => "LOOP",
            IssueKind::LengthMismatch => "LEN-MM",
            IssueKind::ExcessiveLength => "LEN-MAX",
            IssueKind::OpenStart => "DISC-START",
            IssueKind::OpenEnd => "DISC-END",
            IssueKind::OrphanPoint => "ORPHAN",
            IssueKind::DuplicatePoint => "DUP",
            IssueKind::SewageWithoutManholes => "NO-MH",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            IssueKind::SelfLoop => "Self-loop",
            IssueKind::LengthMismatch => "Length mismatch",
            IssueKind::ExcessiveLength => "Segment too long",
            IssueKind::OpenStart => "Open start",
            IssueKind::OpenEnd => "Open end",
            IssueKind::OrphanPoint => "Orphan point",
            IssueKind::DuplicatePoint => "Duplicate point",
            IssueKind::SewageWithoutManholes => "Sewage network without manholes",
        }
    }
}

/// A single audit finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub kind: IssueKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Where a map view should jump to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
}

impl Issue {
    fn new(kind: IssueKind, id: String, description: String) -> Self {
        Self {
            id,
            severity: kind.severity(),
            kind,
            title: kind.title().to_string(),
            description,
            target_id: None,
            location: None,
        }
    }

    fn for_segment(kind: IssueKind, segment: &Segment, description: String, at: Coordinate) -> Self {
        let mut issue = Self::new(kind, format!("{}-{}", kind.code(), segment.id), description);
        issue.target_id = Some(segment.id.clone());
        issue.location = Some(at);
        issue
    }
}

/// Run every check over the network.
///
/// Findings come out in a stable order for a given input order: per
/// segment, then per point, then the whole-network checks.
pub fn audit(network: &Network, tolerances: &AuditTolerances) -> Vec<Issue> {
    let index = EndpointIndex::from_network(network);
    let mut issues = Vec::new();

    for (i, segment) in network.segments.iter().enumerate() {
        check_segment(i, segment, &index, tolerances, &mut issues);
    }

    for (i, point) in network.points.iter().enumerate() {
        let wired = index.any_within(point.location, tolerances.coincidence_m, |n| {
            n.owner.segment().is_some()
        });
        if !wired {
            let mut issue = Issue::new(
                IssueKind::OrphanPoint,
                format!("{}-{}", IssueKind::OrphanPoint.code(), point.id),
                format!("\"{}\" is on the map but not connected to any segment.", point.name),
            );
            issue.target_id = Some(point.id.clone());
            issue.location = Some(point.location);
            issues.push(issue);
        }

        let mut twins: Vec<usize> = index
            .within(point.location, tolerances.degenerate_m)
            .into_iter()
            .filter_map(|n| match n.owner {
                NodeOwner::Point(j) if j > i => Some(j),
                _ => None,
            })
            .collect();
        twins.sort_unstable();

        for j in twins {
            let other = &network.points[j];
            let mut issue = Issue::new(
                IssueKind::DuplicatePoint,
                format!("{}-{}-{}", IssueKind::DuplicatePoint.code(), point.id, other.id),
                format!("\"{}\" and \"{}\" share the same location.", point.name, other.name),
            );
            issue.target_id = Some(point.id.clone());
            issue.location = Some(point.location);
            issues.push(issue);
        }
    }

    if let Some(sewer) = network.segments.iter().find(|s| s.network_type == NetworkType::Sewage) {
        if !network.points.iter().any(|p| p.kind == PointKind::Manhole) {
            let mut issue = Issue::new(
                IssueKind::SewageWithoutManholes,
                IssueKind::SewageWithoutManholes.code().to_string(),
                "The project has sewage segments but no manholes are recorded.".to_string(),
            );
            issue.location = Some(sewer.start_node);
            issues.push(issue);
        }
    }

    info!(
        segments = network.segments.len(),
        points = network.points.len(),
        issues = issues.len(),
        "Audit complete"
    );
    issues
}

fn check_segment(
    i: usize,
    segment: &Segment,
    index: &EndpointIndex,
    tolerances: &AuditTolerances,
    issues: &mut Vec<Issue>,
) {
    let span = distance_meters(segment.start_node, segment.end_node);

    if span < tolerances.degenerate_m {
        issues.push(Issue::for_segment(
            IssueKind::SelfLoop,
            segment,
            format!("Segment \"{}\" starts and ends at the same point.", segment.name),
            segment.start_node,
        ));
    }

    if segment.length_meters < tolerances.min_declared_length_m && span > tolerances.coincidence_m {
        issues.push(Issue::for_segment(
            IssueKind::LengthMismatch,
            segment,
            format!(
                "Declared length is {} m but the geometry spans {} m.",
                segment.length_meters,
                span.round()
            ),
            segment.start_node,
        ));
    }

    if span > tolerances.max_segment_length_m {
        issues.push(Issue::for_segment(
            IssueKind::ExcessiveLength,
            segment,
            format!(
                "Segment \"{}\" spans {} m with no intermediate control points (limit {} m).",
                segment.name,
                span.round(),
                tolerances.max_segment_length_m
            ),
            midpoint(segment.start_node, segment.end_node),
        ));
    }

    // Own endpoints never count: a segment cannot connect to itself.
    let foreign = |n: &crate::index::IndexedNode| n.owner.segment() != Some(i);

    if !index.any_within(segment.start_node, tolerances.coincidence_m, foreign) {
        issues.push(Issue::for_segment(
            IssueKind::OpenStart,
            segment,
            format!("The start of \"{}\" connects to nothing else in the network.", segment.name),
            segment.start_node,
        ));
    }

    if !index.any_within(segment.end_node, tolerances.coincidence_m, foreign) {
        issues.push(Issue::for_segment(
            IssueKind::OpenEnd,
            segment,
            format!("The end of \"{}\" connects to nothing else in the network.", segment.name),
            segment.end_node,
        ));
    }

    debug!(segment = %segment.id, span_m = span, "Segment checked");
}
