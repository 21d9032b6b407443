//! Command implementations

mod audit;
mod config;
mod import;
mod stats;
mod template;

use crate::cli::{Cli, Commands, NetworkFiles};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use infratrack_core::config::{CliConfigOverrides, LayeredConfig};
use infratrack_core::{FormatRegistry, ImportContext, Network, TabularTarget};
use std::path::PathBuf;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let network = match &cli.command {
        Commands::Import(args) => args.network,
        Commands::Audit(args) => args.input.network,
        Commands::Stats(args) => args.input.network,
        Commands::Template(_) | Commands::Config => None,
    };
    let tolerance = match &cli.command {
        Commands::Audit(args) => args.tolerance,
        _ => None,
    };
    let overrides = CliConfigOverrides {
        utm_zone: cli.utm_zone,
        coincidence_tolerance_m: tolerance,
        network: network.map(Into::into),
        ..Default::default()
    };
    let config = load_config(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Import(args) => import::execute(args, &config, &output).await,
        Commands::Audit(args) => audit::execute(args, &config, &output).await,
        Commands::Stats(args) => stats::execute(args, &config, &output).await,
        Commands::Template(args) => template::execute(args, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Import every file into one network.
///
/// Any file that cannot be read aborts the whole command, so a partially
/// merged network is never audited.
pub(crate) async fn load_network(
    input: &NetworkFiles,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<Network> {
    let registry = FormatRegistry::with_defaults();
    let ctx = ImportContext::from_config(config);

    let jobs = input
        .files
        .iter()
        .map(|path| (path, ctx))
        .chain(input.points_files.iter().map(|path| (path, ctx.with_target(TabularTarget::Points))));

    let mut network = Network::default();
    for (path, ctx) in jobs {
        let outcome = registry
            .import_path(path, &ctx)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;

        if outcome.report.skipped > 0 {
            output.warning(format!("{}: {}", path.display(), outcome.report.status_message()));
        }
        tracing::debug!(
            path = %path.display(),
            segments = outcome.network.segments.len(),
            points = outcome.network.points.len(),
            "Merging import"
        );
        network.merge(outcome.network);
    }

    Ok(network)
}

pub(crate) fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
