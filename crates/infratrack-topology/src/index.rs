//! R-tree over segment endpoints and point locations
//!
//! Queries fetch candidates from a degree envelope padded around the probe
//! and then confirm each one with the haversine distance, so a query returns
//! exactly what a pairwise scan with the same tolerance would.

use infratrack_core::geo::geodesy::{meters_to_lat_degrees, meters_to_lon_degrees};
use infratrack_core::{distance_meters, Coordinate, Network};
use rstar::{RTree, RTreeObject, AABB};

/// Padding multiplier applied to the envelope so rounding near the poles
/// and the small-angle approximation never exclude a real match
const ENVELOPE_SLACK: f64 = 2.0;

/// Which network element a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOwner {
    SegmentStart(usize),
    SegmentEnd(usize),
    Point(usize),
}

impl NodeOwner {
    /// Index of the owning segment, if the node is a segment endpoint
    pub fn segment(&self) -> Option<usize> {
        match self {
            NodeOwner::SegmentStart(i) | NodeOwner::SegmentEnd(i) => Some(*i),
            NodeOwner::Point(_) => None,
        }
    }
}

/// A located node stored in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedNode {
    pub owner: NodeOwner,
    pub location: Coordinate,
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// Spatial index of every endpoint and point location in a network
pub struct EndpointIndex {
    tree: RTree<IndexedNode>,
}

impl EndpointIndex {
    /// Build the index with bulk loading.
    ///
    /// Non-finite coordinates are left out: no distance to them is ever
    /// below a tolerance, so they can never match anyway.
    pub fn from_network(network: &Network) -> Self {
        let segment_nodes = network.segments.iter().enumerate().flat_map(|(i, s)| {
            [
                IndexedNode { owner: NodeOwner::SegmentStart(i), location: s.start_node },
                IndexedNode { owner: NodeOwner::SegmentEnd(i), location: s.end_node },
            ]
        });
        let point_nodes = network
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedNode { owner: NodeOwner::Point(i), location: p.location });

        let nodes: Vec<IndexedNode> = segment_nodes
            .chain(point_nodes)
            .filter(|n| n.location.is_finite())
            .collect();

        Self { tree: RTree::bulk_load(nodes) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nodes strictly closer than `radius_m` meters to `center`
    pub fn within(&self, center: Coordinate, radius_m: f64) -> Vec<&IndexedNode> {
        if !center.is_finite() || !radius_m.is_finite() || radius_m <= 0.0 {
            return Vec::new();
        }

        search_envelopes(center, radius_m)
            .into_iter()
            .flat_map(|envelope| self.tree.locate_in_envelope(&envelope))
            .filter(|node| distance_meters(center, node.location) < radius_m)
            .collect()
    }

    /// Whether any node accepted by `keep` lies closer than `radius_m` to `center`
    pub fn any_within<F>(&self, center: Coordinate, radius_m: f64, keep: F) -> bool
    where
        F: Fn(&IndexedNode) -> bool,
    {
        self.within(center, radius_m).into_iter().any(keep)
    }
}

/// Degree windows around `center` that together hold every node within
/// `radius_m`. A window reaching past ±180° gets a twin shifted by 360°
/// for nodes on the far side of the antimeridian.
fn search_envelopes(center: Coordinate, radius_m: f64) -> Vec<AABB<[f64; 2]>> {
    let lat_pad = meters_to_lat_degrees(radius_m) * ENVELOPE_SLACK;
    // Longitude degrees shrink toward the poles, so size the pad at the
    // most poleward latitude the envelope reaches.
    let poleward = (center.y.abs() + lat_pad).min(90.0);
    let lon_pad = meters_to_lon_degrees(radius_m, poleward) * ENVELOPE_SLACK;
    let (south, north) = (center.y - lat_pad, center.y + lat_pad);

    if lon_pad >= 180.0 {
        return vec![AABB::from_corners([f64::MIN, south], [f64::MAX, north])];
    }

    let window = |x: f64| AABB::from_corners([x - lon_pad, south], [x + lon_pad, north]);
    let mut envelopes = vec![window(center.x)];
    if center.x - lon_pad < -180.0 {
        envelopes.push(window(center.x + 360.0));
    }
    if center.x + lon_pad > 180.0 {
        envelopes.push(window(center.x - 360.0));
    }
    envelopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use infratrack_core::{NetworkPoint, NetworkType, PointKind, Segment};
    use proptest::prelude::*;

    fn segment(id: &str, start: (f64, f64), end: (f64, f64)) -> Segment {
        Segment::imported(
            id,
            id,
            NetworkType::Water,
            Coordinate::new(start.0, start.1),
            Coordinate::new(end.0, end.1),
            10.0,
            "test",
        )
    }

    #[test]
    fn test_index_holds_every_finite_node() {
        let network = Network::new(
            vec![segment("a", (39.23, 21.60), (39.231, 21.601)), segment("b", (f64::NAN, 0.0), (1.0, 1.0))],
            vec![NetworkPoint::imported("p", "p", PointKind::Valve, Coordinate::new(39.23, 21.60))],
        );
        let index = EndpointIndex::from_network(&network);
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_within_confirms_with_haversine() {
        let network = Network::new(
            vec![segment("a", (39.23, 21.60), (39.231, 21.601))],
            vec![NetworkPoint::imported(
                "p",
                "p",
                PointKind::Manhole,
                Coordinate::new(39.230_005, 21.60),
            )],
        );
        let index = EndpointIndex::from_network(&network);

        let hits = index.within(Coordinate::new(39.23, 21.60), 1.0);
        let owners: Vec<NodeOwner> = hits.iter().map(|n| n.owner).collect();
        assert_eq!(owners.len(), 2);
        assert!(owners.contains(&NodeOwner::SegmentStart(0)));
        assert!(owners.contains(&NodeOwner::Point(0)));

        assert!(index.within(Coordinate::new(f64::NAN, 21.60), 1.0).is_empty());
        assert!(index.within(Coordinate::new(39.23, 21.60), 0.0).is_empty());
    }

    #[test]
    fn test_within_reaches_across_the_antimeridian() {
        let network = Network::new(
            vec![
                segment("east", (179.0, 10.0), (179.999_999_5, 10.0)),
                segment("west", (-179.999_999_5, 10.0), (-179.0, 10.0)),
            ],
            Vec::new(),
        );
        let index = EndpointIndex::from_network(&network);

        let from_east: Vec<NodeOwner> =
            index.within(Coordinate::new(179.999_999_5, 10.0), 1.0).iter().map(|n| n.owner).collect();
        assert_eq!(from_east.len(), 2);
        assert!(from_east.contains(&NodeOwner::SegmentStart(1)));

        let from_west: Vec<NodeOwner> =
            index.within(Coordinate::new(-179.999_999_5, 10.0), 1.0).iter().map(|n| n.owner).collect();
        assert_eq!(from_west.len(), 2);
        assert!(from_west.contains(&NodeOwner::SegmentEnd(0)));
    }

    #[test]
    fn test_wide_window_returns_each_node_once() {
        let network = Network::new(
            Vec::new(),
            vec![NetworkPoint::imported("p", "p", PointKind::Valve, Coordinate::new(179.9, 89.999))],
        );
        let index = EndpointIndex::from_network(&network);
        assert_eq!(index.within(Coordinate::new(-179.9, 89.999), 50.0).len(), 1);
    }

    #[test]
    fn test_empty_network() {
        let index = EndpointIndex::from_network(&Network::default());
        assert!(index.is_empty());
        assert!(index.within(Coordinate::new(0.0, 0.0), 5.0).is_empty());
    }

    fn wrap_longitude(x: f64) -> f64 {
        if x > 180.0 {
            x - 360.0
        } else if x < -180.0 {
            x + 360.0
        } else {
            x
        }
    }

    proptest! {
        #[test]
        fn prop_matches_pairwise_scan(
            lon in -180.0f64..=180.0,
            lat in -85.0f64..85.0,
            offsets in prop::collection::vec((-0.00003f64..0.00003, -0.00003f64..0.00003), 1..12),
            radius in 0.5f64..3.0,
        ) {
            let center = Coordinate::new(lon, lat);
            let points: Vec<NetworkPoint> = offsets
                .iter()
                .enumerate()
                .map(|(i, (dx, dy))| {
                    let x = wrap_longitude(lon + dx);
                    NetworkPoint::imported(format!("p{i}"), "p", PointKind::Valve, Coordinate::new(x, lat + dy))
                })
                .collect();
            let network = Network::new(Vec::new(), points);
            let index = EndpointIndex::from_network(&network);

            let mut indexed: Vec<usize> = index
                .within(center, radius)
                .iter()
                .filter_map(|n| match n.owner {
                    NodeOwner::Point(i) => Some(i),
                    _ => None,
                })
                .collect();
            indexed.sort_unstable();

            let scanned: Vec<usize> = network
                .points
                .iter()
                .enumerate()
                .filter(|(_, p)| distance_meters(center, p.location) < radius)
                .map(|(i, _)| i)
                .collect();

            prop_assert_eq!(indexed, scanned);
        }
    }
}
