//! Audit command implementation

use super::{display_paths, load_network};
use crate::cli::AuditArgs;
use crate::output::OutputWriter;
use crate::output_types::AuditOutput;
use anyhow::Result;
use console::style;
use infratrack_core::config::LayeredConfig;
use infratrack_topology::{AuditReport, AuditTolerances, Severity};
use tabled::Tabled;

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Issue")]
    title: String,
    #[tabled(rename = "Details")]
    description: String,
    #[tabled(rename = "Location")]
    location: String,
}

/// Findings never fail the command. Only unreadable input does.
pub async fn execute(args: AuditArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let network = load_network(&args.input, config, output).await?;
    let tolerances = AuditTolerances::from_config(config);
    let report = AuditReport::run(&network, &tolerances);
    let counts = report.counts();

    if output.is_json() {
        let mut files = display_paths(&args.input.files);
        files.extend(display_paths(&args.input.points_files));
        return output.result(AuditOutput {
            files,
            segments: network.segments.len(),
            points: network.points.len(),
            score: report.score,
            counts,
            issues: report.by_severity().into_iter().cloned().collect(),
        });
    }

    output.section("Engineering Audit");
    output.kv("Segments", network.segments.len());
    output.kv("Points", network.points.len());
    output.kv("Connection tolerance", format!("{} m", tolerances.coincidence_m));

    if report.is_clean() {
        output.success("No issues found");
    } else {
        output.table(
            report
                .by_severity()
                .into_iter()
                .map(|issue| IssueRow {
                    severity: severity_label(issue.severity),
                    id: issue.id.clone(),
                    title: issue.title.clone(),
                    description: issue.description.clone(),
                    location: issue
                        .location
                        .map(|c| format!("{:.6}, {:.6}", c.y, c.x))
                        .unwrap_or_default(),
                })
                .collect(),
        );
    }

    output.section("Summary");
    output.kv("Errors", counts.errors);
    output.kv("Warnings", counts.warnings);
    output.kv("Info", counts.info);
    output.kv("Quality score", format!("{}/100", report.score));

    Ok(())
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => style(severity).red().bold().to_string(),
        Severity::Warning => style(severity).yellow().to_string(),
        Severity::Info => style(severity).blue().to_string(),
    }
}
