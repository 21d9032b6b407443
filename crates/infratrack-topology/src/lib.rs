//! InfraTrack Topology - engineering audit of imported networks
//!
//! Connectivity is never stored on the network. It is derived here from
//! coordinate proximity, through an R-tree of segment endpoints and point
//! locations.

pub mod audit;
pub mod index;
pub mod report;

pub use audit::{audit, AuditTolerances, Issue, IssueKind, Severity};
pub use index::{EndpointIndex, IndexedNode, NodeOwner};
pub use report::{AuditReport, SeverityCounts};
