pub mod coordinate;
pub mod network;
pub mod stats;

pub use coordinate::Coordinate;
pub use network::{
    ExecutionStatus, Network, NetworkContext, NetworkPoint, NetworkType, PointKind, Segment,
};
pub use stats::NetworkStats;
