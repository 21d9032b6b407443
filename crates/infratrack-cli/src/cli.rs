use clap::{Parser, Subcommand};
use infratrack_core::config;
use infratrack_core::{NetworkContext, TabularTarget};
use std::path::PathBuf;

/// InfraTrack - import and audit water and sewage networks
#[derive(Parser, Debug)]
#[command(name = "infratrack")]
#[command(about = "Import survey, CAD and GIS files of utility networks and audit their topology", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./infratrack.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// UTM zone number assumed for projected coordinates
    #[arg(long, global = true, value_name = "ZONE", value_parser = parse_zone)]
    pub utm_zone: Option<u8>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Network the imported data belongs to
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum NetworkArg {
    /// Potable water network
    Water,
    /// Sewage network
    Sewage,
    /// Unknown or both
    Mixed,
}

impl From<NetworkArg> for NetworkContext {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Water => NetworkContext::Water,
            NetworkArg::Sewage => NetworkContext::Sewage,
            NetworkArg::Mixed => NetworkContext::Mixed,
        }
    }
}

/// Which template to produce
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TemplateKind {
    /// One pipe per row
    Segments,
    /// One asset per row
    Points,
}

impl From<TemplateKind> for TabularTarget {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Segments => TabularTarget::Segments,
            TemplateKind::Points => TabularTarget::Points,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import one file and show what it contains
    Import(ImportArgs),

    /// Import files, merge them and run the engineering audit
    Audit(AuditArgs),

    /// Show execution statistics for a network
    Stats(StatsArgs),

    /// Write a blank CSV template
    Template(TemplateArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// File to import (xlsx, csv, html, dxf, xml, kmz, kml, geojson, json, zip)
    pub file: PathBuf,

    /// Network the data belongs to
    #[arg(long, value_enum)]
    pub network: Option<NetworkArg>,

    /// Read tabular rows as point assets instead of segments
    #[arg(long)]
    pub points: bool,
}

/// Files that make up one network
#[derive(clap::Args, Debug)]
pub struct NetworkFiles {
    /// Files to import and merge. Tabular files are read as segments.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Tabular files read as point assets
    #[arg(long = "points-file", value_name = "FILE")]
    pub points_files: Vec<PathBuf>,

    /// Network the data belongs to
    #[arg(long, value_enum)]
    pub network: Option<NetworkArg>,
}

#[derive(Parser, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub input: NetworkFiles,

    /// Connection tolerance in meters
    #[arg(long, value_name = "METERS", value_parser = parse_tolerance)]
    pub tolerance: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: NetworkFiles,
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Template layout
    #[arg(value_enum)]
    pub kind: TemplateKind,

    /// Write to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

fn parse_zone(s: &str) -> Result<u8, String> {
    config::parse_utm_zone(s).map_err(|e| e.to_string())
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    config::parse_meters("coincidence_tolerance_m", s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_audit_arguments() {
        let cli = Cli::try_parse_from([
            "infratrack",
            "--json",
            "audit",
            "mains.csv",
            "site.kmz",
            "--points-file",
            "manholes.csv",
            "--network",
            "sewage",
            "--tolerance",
            "2.5",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.input.files.len(), 2);
                assert_eq!(args.input.points_files, vec![PathBuf::from("manholes.csv")]);
                assert!(matches!(args.input.network, Some(NetworkArg::Sewage)));
                assert_eq!(args.tolerance, Some(2.5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_audit_requires_a_file() {
        assert!(Cli::try_parse_from(["infratrack", "audit"]).is_err());
        assert!(Cli::try_parse_from(["infratrack", "template", "pipes"]).is_err());
        assert!(Cli::try_parse_from(["infratrack", "--utm-zone", "61", "config"]).is_err());
        assert!(Cli::try_parse_from(["infratrack", "audit", "a.csv", "--tolerance", "-1"]).is_err());
    }
}
