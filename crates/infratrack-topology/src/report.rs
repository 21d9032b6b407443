//! Display ordering and a quality score over audit findings

use serde::{Deserialize, Serialize};

use crate::audit::{audit, AuditTolerances, Issue, Severity};
use infratrack_core::Network;

/// Points taken off the score per finding
const PENALTY_PER_ISSUE: u32 = 5;

/// Findings of one audit run plus the derived quality score (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub issues: Vec<Issue>,
    pub score: u32,
}

/// How many findings of each severity a report holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }
}

impl AuditReport {
    /// Audit `network` and score the result
    pub fn run(network: &Network, tolerances: &AuditTolerances) -> Self {
        let issues = audit(network, tolerances);
        Self::from_issues(issues, network.is_empty())
    }

    /// An empty network scores 100 whatever the findings.
    pub fn from_issues(issues: Vec<Issue>, empty_network: bool) -> Self {
        let score = if empty_network {
            100
        } else {
            let penalty = u32::try_from(issues.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(PENALTY_PER_ISSUE);
            100u32.saturating_sub(penalty)
        };
        Self { issues, score }
    }

    /// Issues in display order: errors, then warnings, then info. Audit
    /// order is kept within a severity.
    pub fn by_severity(&self) -> Vec<&Issue> {
        let mut ordered: Vec<&Issue> = self.issues.iter().collect();
        ordered.sort_by_key(|issue| issue.severity);
        ordered
    }

    pub fn counts(&self) -> SeverityCounts {
        self.issues.iter().fold(SeverityCounts::default(), |mut counts, issue| {
            match issue.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.info += 1,
            }
            counts
        })
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
