use serde::{Deserialize, Serialize};

use super::network::{ExecutionStatus, Network};

/// Aggregate execution figures over a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub segment_count: usize,
    pub total_length_m: f64,
    pub completed_length_m: f64,
    /// Share of the total length executed, rounded to a whole percent
    pub progress_percent: f64,
    pub point_count: usize,
    pub points_completed: usize,
    pub points_in_progress: usize,
    pub points_pending: usize,
}

impl NetworkStats {
    pub fn compute(network: &Network) -> Self {
        let total_length_m: f64 = network.segments.iter().map(|s| s.length_meters).sum();
        // Partially executed pipes count pro rata.
        let completed_length_m: f64 = network
            .segments
            .iter()
            .map(|s| s.length_meters * f64::from(s.completion_percentage) / 100.0)
            .sum();

        let progress_percent = if total_length_m > 0.0 {
            (completed_length_m / total_length_m * 100.0).round()
        } else {
            0.0
        };

        let count = |status: ExecutionStatus| {
            network.points.iter().filter(|p| p.status == status).count()
        };

        Self {
            segment_count: network.segments.len(),
            total_length_m,
            completed_length_m,
            progress_percent,
            point_count: network.points.len(),
            points_completed: count(ExecutionStatus::Completed),
            points_in_progress: count(ExecutionStatus::InProgress),
            points_pending: count(ExecutionStatus::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, NetworkPoint, NetworkType, PointKind, Segment};
    use chrono::Utc;

    #[test]
    fn test_stats_empty_network() {
        let stats = NetworkStats::compute(&Network::default());
        assert_eq!(stats.segment_count, 0);
        assert_eq!(stats.progress_percent, 0.0);
    }

    #[test]
    fn test_stats_progress_by_length() {
        let c = Coordinate::new(39.0, 21.0);
        let mut done = Segment::imported("A", "A", NetworkType::Water, c, c, 300.0, "X");
        done.set_status(ExecutionStatus::Completed, "eng", Utc::now());
        let mut open = Segment::imported("B", "B", NetworkType::Water, c, c, 100.0, "X");
        open.record_progress(50, "eng", Utc::now());
        let mut mh = NetworkPoint::imported("P", "MH", PointKind::Manhole, c);
        mh.set_status(ExecutionStatus::InProgress, "eng", Utc::now());

        let stats = NetworkStats::compute(&Network::new(vec![done, open], vec![mh]));
        assert_eq!(stats.total_length_m, 400.0);
        assert_eq!(stats.completed_length_m, 350.0);
        assert_eq!(stats.progress_percent, 88.0);
        assert_eq!(stats.points_in_progress, 1);
        assert_eq!(stats.points_pending, 0);
    }
}
