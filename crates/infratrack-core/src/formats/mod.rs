//! Format abstraction layer for multi-format network import
//!
//! Every survey, CAD or GIS format implements the `FormatImporter` trait and
//! turns raw file content into a normalized [`Network`]. The `FormatRegistry`
//! picks an importer by file extension.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use crate::config::LayeredConfig;
use crate::error::{InfraTrackError, Result};
use crate::geo::UtmZone;
use crate::models::{Network, NetworkContext};

mod builder;
pub mod dxf;
pub mod geojson;
pub mod html;
pub mod kml;
pub mod landxml;
pub mod shapefile;
pub mod tabular;
pub mod template;
pub mod validation;

pub use dxf::DxfImporter;
pub use geojson::GeoJsonImporter;
pub use html::HtmlTableImporter;
pub use kml::KmlImporter;
pub use landxml::LandXmlImporter;
pub use shapefile::ShapefileImporter;
pub use tabular::{CsvImporter, SpreadsheetImporter};
pub use template::template_csv;
pub use validation::FormatValidator;

/// How the rows of a tabular file are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabularTarget {
    /// Start/end coordinate pairs, one pipe per row
    #[default]
    Segments,
    /// A single coordinate pair, one asset per row
    Points,
}

/// Everything an importer needs besides the file itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportContext {
    pub network: NetworkContext,
    pub target: TabularTarget,
    pub zone: UtmZone,
}

impl ImportContext {
    pub fn new(network: NetworkContext) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            network: config.network.value,
            target: TabularTarget::Segments,
            zone: config.zone(),
        }
    }

    pub fn with_target(mut self, target: TabularTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_zone(mut self, zone: UtmZone) -> Self {
        self.zone = zone;
        self
    }
}

/// Counts describing one import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub format: String,
    /// Rows, entities or features read from the file
    pub records_seen: usize,
    pub segments: usize,
    pub points: usize,
    /// Records dropped for missing or unusable geometry
    pub skipped: usize,
}

impl ImportReport {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    /// One-line summary for the user
    pub fn status_message(&self) -> String {
        let mut msg = format!(
            "Imported {}: {} segments, {} points",
            self.format, self.segments, self.points
        );
        if self.skipped > 0 {
            msg.push_str(&format!(" ({} of {} records skipped)", self.skipped, self.records_seen));
        }
        msg
    }
}

/// Result of importing one file
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub network: Network,
    pub report: ImportReport,
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Importer trait that all format implementations must implement
#[async_trait]
pub trait FormatImporter: Send + Sync {
    /// Parse a whole file's content.
    ///
    /// Malformed rows or entities are skipped and counted in the report.
    /// An error means the file as a whole could not be read.
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome>;

    /// Get supported file extensions (e.g., ["dxf"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "DXF", "LandXML")
    fn format_name(&self) -> &str;

    /// Read the file from disk and import it
    async fn import_path(&self, path: &Path, ctx: &ImportContext) -> Result<ImportOutcome> {
        let content = tokio::fs::read(path).await?;
        let outcome = self.import(&content, ctx)?;
        tracing::info!(
            path = %path.display(),
            format = self.format_name(),
            segments = outcome.report.segments,
            points = outcome.report.points,
            skipped = outcome.report.skipped,
            "Import finished"
        );
        Ok(outcome)
    }

    /// Cheap checks before a full read
    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let exists = FormatValidator::validate_file_exists(path);
        if !exists.is_valid() {
            return Ok(exists);
        }
        Ok(FormatValidator::merge_validations(vec![
            exists,
            FormatValidator::validate_file_size(path, Some(validation::MAX_IMPORT_SIZE_MB)),
        ]))
    }
}

/// Central registry for format importers
pub struct FormatRegistry {
    importers: Vec<Box<dyn FormatImporter>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Registry with every built-in importer
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SpreadsheetImporter));
        registry.register(Box::new(CsvImporter));
        registry.register(Box::new(HtmlTableImporter));
        registry.register(Box::new(DxfImporter));
        registry.register(Box::new(LandXmlImporter));
        registry.register(Box::new(KmlImporter));
        registry.register(Box::new(GeoJsonImporter));
        registry.register(Box::new(ShapefileImporter));
        registry
    }

    /// Register a format importer
    pub fn register(&mut self, importer: Box<dyn FormatImporter>) {
        self.importers.push(importer);
    }

    /// Detect format and return the importer for this file extension
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatImporter> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| InfraTrackError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            })?;

        self.importers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| InfraTrackError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// Detect the format and import the file
    pub async fn import_path(&self, path: &Path, ctx: &ImportContext) -> Result<ImportOutcome> {
        self.detect_format(path)?.import_path(path, ctx).await
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.importers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered importers
    pub fn importers(&self) -> &[Box<dyn FormatImporter>] {
        &self.importers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockImporter {
        extensions: Vec<&'static str>,
        name: &'static str,
    }

    #[async_trait]
    impl FormatImporter for MockImporter {
        fn import(&self, _content: &[u8], _ctx: &ImportContext) -> Result<ImportOutcome> {
            Ok(ImportOutcome {
                network: Network::default(),
                report: ImportReport::new(self.name),
            })
        }

        fn supported_extensions(&self) -> &[&str] {
            &self.extensions
        }

        fn format_name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_format_registry_creation() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.importers().len(), 0);
    }

    #[test]
    fn test_format_registration() {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(MockImporter {
            extensions: vec!["dxf"],
            name: "DXF",
        }));

        assert_eq!(registry.importers().len(), 1);
        assert_eq!(registry.supported_formats(), vec!["dxf"]);
    }

    #[test]
    fn test_default_registry_covers_every_format() {
        let registry = FormatRegistry::with_defaults();
        for (file, format) in [
            ("pipes.xlsx", "Spreadsheet"),
            ("pipes.ods", "Spreadsheet"),
            ("pipes.CSV", "CSV"),
            ("export.htm", "HTML table"),
            ("drawing.dxf", "DXF"),
            ("civil3d.xml", "LandXML"),
            ("network.kmz", "KML/KMZ"),
            ("network.kml", "KML/KMZ"),
            ("network.geojson", "GeoJSON"),
            ("network.json", "GeoJSON"),
            ("bundle.zip", "Shapefile"),
        ] {
            let importer = registry.detect_format(Path::new(file)).unwrap();
            assert_eq!(importer.format_name(), format, "{file}");
        }
    }

    #[test]
    fn test_unsupported_format() {
        let registry = FormatRegistry::with_defaults();
        let err = registry.detect_format(Path::new("notes.pdf")).err().unwrap();
        match err {
            InfraTrackError::UnsupportedFormat { extension, supported } => {
                assert_eq!(extension, "pdf");
                assert!(supported.contains(&"dxf".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.detect_format(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_status_message() {
        let mut report = ImportReport::new("DXF");
        report.records_seen = 5;
        report.segments = 3;
        report.points = 1;
        assert_eq!(report.status_message(), "Imported DXF: 3 segments, 1 points");
        report.skipped = 1;
        assert!(report.status_message().ends_with("(1 of 5 records skipped)"));
    }

    #[test]
    fn test_format_validation_with_errors() {
        let validation = FormatValidation {
            errors: vec!["Missing file".to_string()],
            warnings: vec![],
        };
        assert!(!validation.is_valid());
        assert!(!validation.has_warnings());
    }

    #[tokio::test]
    async fn test_default_validate_missing_file() {
        let importer = MockImporter {
            extensions: vec!["dxf"],
            name: "DXF",
        };
        let validation = importer.validate(Path::new("/nonexistent/file.dxf")).await.unwrap();
        assert!(!validation.is_valid());
    }
}
