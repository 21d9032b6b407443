//! Zipped ESRI Shapefile import.
//!
//! The bundle is read entirely in memory: every `.shp` member is paired with
//! the `.dbf` of the same stem, converted into GeoJSON features and handed to
//! the same feature walk the GeoJSON importer uses. A layer without a `.dbf`
//! is still read, with empty properties.

use async_trait::async_trait;
use geojson::{Feature, Geometry, Value};
use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{Shape, ShapeReader};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{InfraTrackError, Result};
use crate::formats::geojson::network_from_features;
use crate::formats::{FormatImporter, FormatValidation, FormatValidator, ImportContext, ImportOutcome};

pub struct ShapefileImporter;

/// `.shp` and optional `.dbf` content of one layer
#[derive(Debug, Default)]
struct Layer {
    shp: Option<Vec<u8>>,
    dbf: Option<Vec<u8>>,
}

fn archive_error(reason: impl std::fmt::Display) -> InfraTrackError {
    InfraTrackError::Archive {
        path: "shapefile bundle".to_string(),
        reason: reason.to_string(),
    }
}

fn shapefile_error(e: impl std::fmt::Display) -> InfraTrackError {
    InfraTrackError::format("Shapefile", e)
}

/// Group archive members by stem, keeping only .shp and .dbf
fn read_layers(content: &[u8]) -> Result<BTreeMap<String, Layer>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content)).map_err(archive_error)?;
    let mut layers: BTreeMap<String, Layer> = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(archive_error)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_lowercase();
        let Some((stem, ext)) = name.rsplit_once('.') else {
            continue;
        };
        if ext != "shp" && ext != "dbf" {
            continue;
        }

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let layer = layers.entry(stem.to_string()).or_default();
        if ext == "shp" {
            layer.shp = Some(bytes);
        } else {
            layer.dbf = Some(bytes);
        }
    }

    layers.retain(|stem, layer| {
        if layer.shp.is_none() {
            tracing::debug!("Ignoring {}.dbf without geometry", stem);
        }
        layer.shp.is_some()
    });
    if layers.is_empty() {
        return Err(archive_error("no .shp file inside the archive"));
    }
    Ok(layers)
}

fn position(x: f64, y: f64) -> Vec<f64> {
    vec![x, y]
}

fn shape_to_geometry(shape: &Shape) -> Option<Value> {
    let lines = |parts: Vec<Vec<Vec<f64>>>| match parts.len() {
        0 => None,
        1 => parts.into_iter().next().map(Value::LineString),
        _ => Some(Value::MultiLineString(parts)),
    };

    match shape {
        Shape::Point(p) => Some(Value::Point(position(p.x, p.y))),
        Shape::PointM(p) => Some(Value::Point(position(p.x, p.y))),
        Shape::PointZ(p) => Some(Value::Point(position(p.x, p.y))),
        Shape::Polyline(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        ),
        Shape::PolylineM(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        ),
        Shape::PolylineZ(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        ),
        Shape::Polygon(pg) => Some(Value::Polygon(
            pg.rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        )),
        Shape::PolygonM(pg) => Some(Value::Polygon(
            pg.rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        )),
        Shape::PolygonZ(pg) => Some(Value::Polygon(
            pg.rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| position(p.x, p.y)).collect())
                .collect(),
        )),
        // Multipoints, multipatches and null shapes carry nothing a network can use
        _ => None,
    }
}

fn dbase_to_json(value: &DbaseFieldValue) -> serde_json::Value {
    let number = |n: f64| {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    };
    match value {
        DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s.trim().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::Integer(i) => serde_json::Value::Number((*i).into()),
        DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(*b),
        DbaseFieldValue::Memo(s) => serde_json::Value::String(s.trim().to_string()),
        _ => serde_json::Value::Null,
    }
}

fn feature(shape: &Shape, properties: Option<geojson::JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: shape_to_geometry(shape).map(Geometry::new),
        id: None,
        properties,
        foreign_members: None,
    }
}

fn layer_features(stem: &str, layer: Layer) -> Result<Vec<Feature>> {
    let shp = layer.shp.unwrap_or_default();
    let shape_reader = ShapeReader::new(Cursor::new(shp)).map_err(shapefile_error)?;

    let Some(dbf) = layer.dbf else {
        tracing::debug!("Layer {} has no .dbf, reading geometry only", stem);
        let shapes = shape_reader.read().map_err(shapefile_error)?;
        return Ok(shapes.iter().map(|s| feature(s, None)).collect());
    };

    let dbase_reader = shapefile::dbase::Reader::new(Cursor::new(dbf)).map_err(shapefile_error)?;
    let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(shapefile_error)?;
        let properties = record
            .into_iter()
            .map(|(name, value)| (name, dbase_to_json(&value)))
            .collect();
        features.push(feature(&shape, Some(properties)));
    }
    Ok(features)
}

#[async_trait]
impl FormatImporter for ShapefileImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let mut features = Vec::new();
        for (stem, layer) in read_layers(content)? {
            let layer_features = layer_features(&stem, layer)?;
            tracing::debug!(layer = %stem, features = layer_features.len(), "Read shapefile layer");
            features.extend(layer_features);
        }
        network_from_features(&features, self.format_name(), ctx)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["zip"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }
        let content = tokio::fs::read(path).await?;
        Ok(FormatValidator::merge_validations(vec![
            validation,
            FormatValidator::validate_archive_members(&content, &["shp"], &["dbf", "shx", "prj"]),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkContext, NetworkType, PointKind};
    use std::io::Write;

    /// Main-file header for `shape_type` with the given record bytes appended
    fn shp(shape_type: i32, records: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = records
            .iter()
            .enumerate()
            .flat_map(|(i, content)| {
                let mut rec = Vec::new();
                rec.extend_from_slice(&(i as i32 + 1).to_be_bytes());
                rec.extend_from_slice(&(content.len() as i32 / 2).to_be_bytes());
                rec.extend_from_slice(content);
                rec
            })
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&(((100 + body.len()) / 2) as i32).to_be_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&shape_type.to_le_bytes());
        for v in [39.0f64, 21.0, 40.0, 22.0, 0.0, 0.0, 0.0, 0.0] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&body);
        out
    }

    fn point_record(x: f64, y: f64) -> Vec<u8> {
        let mut c = 1i32.to_le_bytes().to_vec();
        c.extend_from_slice(&x.to_le_bytes());
        c.extend_from_slice(&y.to_le_bytes());
        c
    }

    fn polyline_record(points: &[(f64, f64)]) -> Vec<u8> {
        let mut c = 3i32.to_le_bytes().to_vec();
        for v in [39.0f64, 21.0, 40.0, 22.0] {
            c.extend_from_slice(&v.to_le_bytes());
        }
        c.extend_from_slice(&1i32.to_le_bytes());
        c.extend_from_slice(&(points.len() as i32).to_le_bytes());
        c.extend_from_slice(&0i32.to_le_bytes());
        for (x, y) in points {
            c.extend_from_slice(&x.to_le_bytes());
            c.extend_from_slice(&y.to_le_bytes());
        }
        c
    }

    /// dBase III table with a single character column
    fn dbf(column: &str, values: &[&str]) -> Vec<u8> {
        const WIDTH: u8 = 20;
        let mut out = vec![0x03, 124, 1, 1];
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        out.extend_from_slice(&(32u16 + 32 + 1).to_le_bytes());
        out.extend_from_slice(&(1 + WIDTH as u16).to_le_bytes());
        out.extend_from_slice(&[0u8; 20]);

        let mut descriptor = [0u8; 32];
        descriptor[..column.len()].copy_from_slice(column.as_bytes());
        descriptor[11] = b'C';
        descriptor[16] = WIDTH;
        out.extend_from_slice(&descriptor);
        out.push(0x0D);

        for v in values {
            out.push(b' ');
            let mut cell = v.as_bytes().to_vec();
            cell.resize(WIDTH as usize, b' ');
            out.extend_from_slice(&cell);
        }
        out.push(0x1A);
        out
    }

    fn bundle(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_two_layers_with_attributes() {
        let content = bundle(&[
            ("pipes.shp", shp(3, &[polyline_record(&[(39.23, 21.60), (39.2305, 21.6005), (39.231, 21.601)])])),
            ("pipes.dbf", dbf("NAME", &["Gravity main"])),
            ("nodes.shp", shp(1, &[point_record(39.231, 21.601)])),
            ("nodes.dbf", dbf("TYPE", &["Manhole"])),
            ("nodes.prj", b"GEOGCS[\"WGS 84\"]".to_vec()),
        ]);

        let out = ShapefileImporter
            .import(&content, &ImportContext::new(NetworkContext::Mixed))
            .unwrap();

        let segs = &out.network.segments;
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].name, "Gravity main");
        assert_eq!(segs[0].network_type, NetworkType::Sewage);
        assert_eq!(segs[0].end_node.x, 39.231);
        assert_eq!(segs[0].contractor, "GIS Import");

        let pts = &out.network.points;
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].kind, PointKind::Manhole);
        assert_eq!(out.report.format, "Shapefile");
    }

    #[test]
    fn test_layer_without_dbf() {
        let content = bundle(&[("data/valves.shp", shp(1, &[point_record(39.1, 21.9), point_record(39.2, 21.8)]))]);
        let out = ShapefileImporter
            .import(&content, &ImportContext::new(NetworkContext::Water))
            .unwrap();
        assert_eq!(out.network.points.len(), 2);
        assert_eq!(out.network.points[1].name, "GIS-Item-1");
    }

    #[test]
    fn test_bundle_without_shp() {
        let content = bundle(&[("readme.txt", b"nothing here".to_vec())]);
        let err = ShapefileImporter.import(&content, &ImportContext::default()).unwrap_err();
        assert!(matches!(err, InfraTrackError::Archive { .. }));

        assert!(ShapefileImporter.import(b"not a zip", &ImportContext::default()).is_err());
    }
}
