//! Import command implementation

use crate::cli::ImportArgs;
use crate::output::OutputWriter;
use crate::output_types::ImportOutput;
use anyhow::{Context, Result};
use infratrack_core::config::LayeredConfig;
use infratrack_core::{FormatRegistry, ImportContext, TabularTarget};
use tabled::Tabled;

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    network_type: String,
    #[tabled(rename = "Length (m)")]
    length: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Location")]
    location: String,
}

pub async fn execute(args: ImportArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let registry = FormatRegistry::with_defaults();
    let importer = registry.detect_format(&args.file)?;

    let validation = importer.validate(&args.file).await?;
    for warning in &validation.warnings {
        output.warning(warning);
    }
    if !validation.is_valid() {
        anyhow::bail!(
            "{} is not a readable {} file: {}",
            args.file.display(),
            importer.format_name(),
            validation.errors.join("; ")
        );
    }

    let mut ctx = ImportContext::from_config(config);
    if args.points {
        ctx = ctx.with_target(TabularTarget::Points);
    }

    let outcome = importer
        .import_path(&args.file, &ctx)
        .await
        .with_context(|| format!("Failed to import {}", args.file.display()))?;

    if output.is_json() {
        return output.result(ImportOutput {
            file: args.file.display().to_string(),
            report: outcome.report,
            network: outcome.network,
        });
    }

    output.success(outcome.report.status_message());

    let network = &outcome.network;
    if !network.segments.is_empty() {
        output.section("Segments");
        output.table(
            network
                .segments
                .iter()
                .map(|s| SegmentRow {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    network_type: s.network_type.to_string(),
                    length: format!("{:.1}", s.length_meters),
                    start: format!("{:.6}, {:.6}", s.start_node.y, s.start_node.x),
                    end: format!("{:.6}, {:.6}", s.end_node.y, s.end_node.x),
                })
                .collect(),
        );
    }

    if !network.points.is_empty() {
        output.section("Points");
        output.table(
            network
                .points
                .iter()
                .map(|p| PointRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    kind: p.kind.to_string(),
                    location: format!("{:.6}, {:.6}", p.location.y, p.location.x),
                })
                .collect(),
        );
    }

    if network.is_empty() {
        output.info("Nothing usable was found in the file");
    }

    Ok(())
}
