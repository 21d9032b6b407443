//! Blank CSV templates for surveyors

use crate::error::{InfraTrackError, Result};
use crate::formats::TabularTarget;

const SEGMENT_HEADERS: [&str; 6] = ["Name", "StartLat", "StartLon", "EndLat", "EndLon", "Length"];
const SEGMENT_SAMPLE: [&str; 6] = ["Pipe 1", "2423087", "510669", "2423187", "510769", "150"];

const POINT_HEADERS: [&str; 4] = ["Name", "Lat", "Lon", "Type"];
const POINT_SAMPLE: [&str; 4] = ["Manhole 1", "2423087", "510669", "Manhole"];

/// Header row plus one sample row in UTM meters, ready to be filled in and
/// imported back with the CSV importer
pub fn template_csv(target: TabularTarget) -> Result<String> {
    let (headers, sample): (&[&str], &[&str]) = match target {
        TabularTarget::Segments => (&SEGMENT_HEADERS, &SEGMENT_SAMPLE),
        TabularTarget::Points => (&POINT_HEADERS, &POINT_SAMPLE),
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .and_then(|_| writer.write_record(sample))
        .map_err(|e| InfraTrackError::Serialization(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| InfraTrackError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| InfraTrackError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{CsvImporter, FormatImporter, ImportContext};
    use crate::models::{NetworkContext, PointKind};

    #[test]
    fn test_segment_template_layout() {
        let csv = template_csv(TabularTarget::Segments).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Name,StartLat,StartLon,EndLat,EndLon,Length"));
        assert_eq!(lines.next(), Some("Pipe 1,2423087,510669,2423187,510769,150"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_templates_import_cleanly() {
        let segments = template_csv(TabularTarget::Segments).unwrap();
        let out = CsvImporter
            .import(segments.as_bytes(), &ImportContext::new(NetworkContext::Water))
            .unwrap();
        assert_eq!(out.network.segments.len(), 1);
        assert_eq!(out.network.segments[0].length_meters, 150.0);
        assert!((out.network.segments[0].start_node.x - 39.103).abs() < 1e-3);

        let points = template_csv(TabularTarget::Points).unwrap();
        let ctx = ImportContext::new(NetworkContext::Sewage).with_target(TabularTarget::Points);
        let out = CsvImporter.import(points.as_bytes(), &ctx).unwrap();
        assert_eq!(out.network.points.len(), 1);
        assert_eq!(out.network.points[0].kind, PointKind::Manhole);
    }
}
