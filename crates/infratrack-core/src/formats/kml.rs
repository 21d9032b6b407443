//! KML and KMZ import.
//!
//! A KMZ is a zip holding a KML document; the first `.kml` member is read.
//! Each `Placemark` with a `LineString` becomes one segment from its first
//! to its last vertex; a `Placemark` with a `Point` becomes a point.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

use super::builder::{NetworkBuilder, RawSegment};
use crate::error::{InfraTrackError, Result};
use crate::formats::{FormatImporter, FormatValidation, FormatValidator, ImportContext, ImportOutcome};

const CONTRACTOR: &str = "KMZ Import";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub struct KmlImporter;

#[derive(Debug, Default)]
struct Placemark {
    name: Option<String>,
    description: String,
    line: Option<String>,
    point: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Geometry {
    None,
    LineString,
    Point,
}

/// Pull the first `.kml` member out of a KMZ archive
pub fn extract_kml(content: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content)).map_err(|e| InfraTrackError::Archive {
        path: "kmz".to_string(),
        reason: e.to_string(),
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| InfraTrackError::Archive {
            path: "kmz".to_string(),
            reason: e.to_string(),
        })?;
        if file.is_file() && file.name().to_lowercase().ends_with(".kml") {
            let mut kml = Vec::new();
            file.read_to_end(&mut kml)?;
            return Ok(kml);
        }
    }

    Err(InfraTrackError::Archive {
        path: "kmz".to_string(),
        reason: "no .kml document inside the archive".to_string(),
    })
}

/// Split a KML coordinates string into (lon, lat) tuples
fn parse_tuples(text: &str) -> Vec<(f64, f64)> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>().unwrap_or(f64::NAN));
            let x = parts.next().unwrap_or(f64::NAN);
            let y = parts.next().unwrap_or(f64::NAN);
            (x, y)
        })
        .collect()
}

fn read_placemarks(kml: &[u8]) -> Result<Vec<Placemark>> {
    let mut reader = Reader::from_reader(kml);
    reader.config_mut().trim_text(true);

    let mut placemarks = Vec::new();
    let mut current: Option<Placemark> = None;
    let mut geometry = Geometry::None;
    let mut field: Option<&'static str> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            InfraTrackError::format("KML", format!("XML error at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Placemark" => current = Some(Placemark::default()),
                b"LineString" if current.is_some() => geometry = Geometry::LineString,
                b"Point" if current.is_some() => geometry = Geometry::Point,
                b"name" if current.is_some() => field = Some("name"),
                b"description" if current.is_some() => field = Some("description"),
                b"coordinates" if current.is_some() => field = Some("coordinates"),
                _ => {}
            },
            Event::Text(t) if field.is_some() => {
                text.push_str(&t.unescape().map_err(|e| InfraTrackError::format("KML", e))?);
            }
            Event::CData(c) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"name" | b"description" | b"coordinates" => {
                    let value = std::mem::take(&mut text);
                    if let (Some(pm), Some(f)) = (current.as_mut(), field.take()) {
                        match f {
                            "name" if pm.name.is_none() => pm.name = Some(value.trim().to_string()),
                            "description" => pm.description = value.trim().to_string(),
                            "coordinates" => match geometry {
                                Geometry::LineString if pm.line.is_none() => pm.line = Some(value),
                                Geometry::Point if pm.point.is_none() => pm.point = Some(value),
                                _ => {}
                            },
                            _ => {}
                        }
                    }
                }
                b"LineString" | b"Point" => geometry = Geometry::None,
                b"Placemark" => placemarks.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(placemarks)
}

#[async_trait]
impl FormatImporter for KmlImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let kml = if content.starts_with(ZIP_MAGIC) {
            extract_kml(content)?
        } else {
            content.to_vec()
        };
        let placemarks = read_placemarks(&kml)?;

        let mut builder = NetworkBuilder::new(self.format_name(), ctx)?;
        for (i, pm) in placemarks.into_iter().enumerate() {
            builder.seen();
            let name = pm
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("KMZ item {}", i));
            let label = format!("{} {}", name, pm.description);

            if let Some(coords) = pm.line {
                let tuples = parse_tuples(&coords);
                let (Some(first), Some(last)) = (tuples.first(), tuples.last()) else {
                    builder.skip(&name, "empty LineString");
                    continue;
                };
                if tuples.len() < 2 {
                    builder.skip(&name, "LineString with a single vertex");
                    continue;
                }
                let (start, end) = (*first, *last);
                let id = builder.id("KMZ-S", i);
                builder.push_segment(RawSegment {
                    id,
                    name,
                    label: &label,
                    start,
                    end,
                    declared_length: 0.0,
                    contractor: CONTRACTOR.to_string(),
                });
            } else if let Some(coords) = pm.point {
                let compact: String = coords.chars().filter(|c| !c.is_whitespace()).collect();
                let Some(&location) = parse_tuples(&compact).first() else {
                    builder.skip(&name, "empty Point");
                    continue;
                };
                let id = builder.id("KMZ-P", i);
                builder.push_point(id, name, label.trim(), location);
            } else {
                builder.skip(&name, "no LineString or Point geometry");
            }
        }

        Ok(builder.finish())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["kmz", "kml"]
    }

    fn format_name(&self) -> &str {
        "KML/KMZ"
    }

    async fn validate(&self, path: &std::path::Path) -> Result<FormatValidation> {
        let content = tokio::fs::read(path).await?;
        if content.starts_with(ZIP_MAGIC) {
            Ok(FormatValidator::validate_archive_members(&content, &["kml"], &[]))
        } else {
            Ok(FormatValidator::validate_xml_structure(&content))
        }
    }
}
