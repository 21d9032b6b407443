//! GeoJSON import, plus the feature walk shared with zipped shapefiles

use async_trait::async_trait;
use geojson::{Feature, GeoJson, Geometry, Value};
use std::path::Path;

use super::builder::{NetworkBuilder, RawSegment};
use crate::error::{InfraTrackError, Result};
use crate::formats::{FormatImporter, FormatValidation, FormatValidator, ImportContext, ImportOutcome};
use crate::schema::{CellValue, Record};

const CONTRACTOR: &str = "GIS Import";

pub const FEATURE_NAME: &[&str] = &["Name", "id"];
pub const FEATURE_TYPE: &[&str] = &["Type", "Class", "Category", "Layer", "Network", "Service"];

/// GeoJSON importer
pub struct GeoJsonImporter;

fn cell_from_json(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::Bool(b) => CellValue::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
        serde_json::Value::String(s) => CellValue::from(s.as_str()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Property bag of a feature as a fuzzy-matchable record
pub fn feature_record(feature: &Feature) -> Record {
    feature
        .properties
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), cell_from_json(v)))
        .collect()
}

/// First and last vertex of a line-like geometry
fn line_ends(value: &Value) -> Option<(&[f64], &[f64])> {
    let line = match value {
        Value::LineString(line) => line,
        Value::MultiLineString(lines) => lines.first()?,
        Value::Polygon(rings) => rings.first()?,
        _ => return None,
    };
    if line.len() < 2 {
        return None;
    }
    Some((line.first()?.as_slice(), line.last()?.as_slice()))
}

fn pair(position: &[f64]) -> (f64, f64) {
    (
        position.first().copied().unwrap_or(f64::NAN),
        position.get(1).copied().unwrap_or(f64::NAN),
    )
}

/// Turn GeoJSON-shaped features into a network.
///
/// Line strings, the first line of a multi line string and the exterior
/// ring of a polygon become one segment each, first vertex to last. Points
/// become points. Anything else is skipped.
pub fn network_from_features(features: &[Feature], format: &str, ctx: &ImportContext) -> Result<ImportOutcome> {
    let mut builder = NetworkBuilder::new(format, ctx)?;

    for (idx, feature) in features.iter().enumerate() {
        builder.seen();
        let record = feature_record(feature);
        let name = record
            .text(FEATURE_NAME)
            .unwrap_or_else(|| format!("GIS-Item-{}", idx));
        let label = match record.text(FEATURE_TYPE) {
            Some(kind) => format!("{} {}", kind, name),
            None => name.clone(),
        };

        let Some(geometry) = feature.geometry.as_ref() else {
            builder.skip(&name, "feature without geometry");
            continue;
        };

        match &geometry.value {
            Value::Point(position) => {
                let id = builder.id("GIS-P", idx);
                builder.push_point(id, name, &label, pair(position));
            }
            value => match line_ends(value) {
                Some((first, last)) => {
                    let id = builder.id("GIS-S", idx);
                    builder.push_segment(RawSegment {
                        id,
                        name,
                        label: &label,
                        start: pair(first),
                        end: pair(last),
                        declared_length: 0.0,
                        contractor: CONTRACTOR.to_string(),
                    });
                }
                None => builder.skip(&name, "unsupported or empty geometry"),
            },
        }
    }

    Ok(builder.finish())
}

fn bare_feature(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

/// Collect features from any accepted top-level shape
pub fn parse_features(content: &[u8]) -> Result<Vec<Feature>> {
    let json: serde_json::Value = serde_json::from_slice(content)
        .map_err(|e| InfraTrackError::format("GeoJSON", format!("Invalid JSON: {}", e)))?;

    if let serde_json::Value::Array(items) = json {
        let features = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match Feature::try_from(item) {
                Ok(feature) => Some(feature),
                Err(e) => {
                    tracing::debug!("Skipping array element {}: {}", i, e);
                    None
                }
            })
            .collect();
        return Ok(features);
    }

    let geojson = GeoJson::from_json_value(json)
        .map_err(|e| InfraTrackError::format("GeoJSON", format!("Failed to parse GeoJSON: {}", e)))?;

    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![bare_feature(geometry)],
    })
}

#[async_trait]
impl FormatImporter for GeoJsonImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let features = parse_features(content)?;
        network_from_features(&features, self.format_name(), ctx)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }
        let content = tokio::fs::read(path).await?;
        Ok(FormatValidator::merge_validations(vec![
            validation,
            FormatValidator::validate_json_structure(&content),
        ]))
    }
}
