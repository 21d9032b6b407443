use infratrack_core::config::ConfigSource;
use infratrack_core::{ImportReport, Network, NetworkStats, TabularTarget};
use infratrack_topology::{Issue, SeverityCounts};
use serde::Serialize;

/// Output for import command
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub file: String,
    pub report: ImportReport,
    pub network: Network,
}

/// Output for audit command
#[derive(Debug, Serialize)]
pub struct AuditOutput {
    pub files: Vec<String>,
    pub segments: usize,
    pub points: usize,
    pub score: u32,
    pub counts: SeverityCounts,
    /// Display order: errors, warnings, info
    pub issues: Vec<Issue>,
}

/// Output for stats command
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub files: Vec<String>,
    pub stats: NetworkStats,
}

/// Output for template command
#[derive(Debug, Serialize)]
pub struct TemplateOutput {
    pub kind: TabularTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ConfigSource,
}
