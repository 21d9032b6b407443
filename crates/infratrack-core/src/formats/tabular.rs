//! Tabular imports: spreadsheets and CSV files.
//!
//! Rows are either all segments or all points, chosen by
//! [`ImportContext::target`]. Column names are resolved through the fuzzy
//! alias lists below, so "Start Lat", "start_lat" and "Y1" all work.

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::builder::{NetworkBuilder, RawSegment};
use crate::error::{InfraTrackError, Result};
use crate::formats::{FormatImporter, ImportContext, ImportOutcome, TabularTarget};
use crate::schema::{records_from_rows, CellValue, Record};

pub const START_X: &[&str] = &["StartLon", "Start Longitude", "StartX", "X1", "Lon1", "Start_Lon", "Start Lon"];
pub const START_Y: &[&str] = &["StartLat", "Start Latitude", "StartY", "Y1", "Lat1", "Start_Lat", "Start Lat"];
pub const END_X: &[&str] = &["EndLon", "End Longitude", "EndX", "X2", "Lon2", "End_Lon", "End Lon"];
pub const END_Y: &[&str] = &["EndLat", "End Latitude", "EndY", "Y2", "Lat2", "End_Lat", "End Lat"];
pub const LENGTH: &[&str] = &["Length", "Len", "Distance"];
pub const SEGMENT_NAME: &[&str] = &["Name", "Segment Name", "Pipe Name"];
pub const CONTRACTOR: &[&str] = &["Contractor", "Company"];
pub const SEGMENT_TYPE: &[&str] = &["Type", "Network", "Service"];

pub const POINT_X: &[&str] = &["Lon", "Longitude", "X", "Easting"];
pub const POINT_Y: &[&str] = &["Lat", "Latitude", "Y", "Northing"];
pub const POINT_NAME: &[&str] = &["Name", "Point Name", "Node Name"];
pub const POINT_TYPE: &[&str] = &["Type", "Point Type", "Class", "Category"];

/// Turn parsed rows into a network according to the context's target
pub fn network_from_records(records: &[Record], format: &str, ctx: &ImportContext) -> Result<ImportOutcome> {
    let mut builder = NetworkBuilder::new(format, ctx)?;
    for (idx, record) in records.iter().enumerate() {
        builder.seen();
        match ctx.target {
            TabularTarget::Segments => segment_row(&mut builder, idx, record),
            TabularTarget::Points => point_row(&mut builder, idx, record),
        }
    }
    Ok(builder.finish())
}

fn segment_row(builder: &mut NetworkBuilder<'_>, idx: usize, record: &Record) {
    let start = (record.number(START_X), record.number(START_Y));
    let end = (record.number(END_X), record.number(END_Y));

    if is_origin(start) || is_origin(end) {
        builder.skip(format!("row {}", idx + 1), "no start/end coordinates");
        return;
    }

    let name = record.text(SEGMENT_NAME).unwrap_or_else(|| format!("Pipe {}", idx + 1));
    let kind = record.text(SEGMENT_TYPE).unwrap_or_default();
    let label = format!("{} {}", kind, name);
    let id = builder.id("TAB-S", idx);

    builder.push_segment(RawSegment {
        id,
        name,
        label: &label,
        start,
        end,
        declared_length: record.number(LENGTH),
        contractor: record.text(CONTRACTOR).unwrap_or_else(|| "Unknown".to_string()),
    });
}

fn point_row(builder: &mut NetworkBuilder<'_>, idx: usize, record: &Record) {
    let x = record.number(POINT_X);
    let y = record.number(POINT_Y);

    if x == 0.0 || y == 0.0 {
        builder.skip(format!("row {}", idx + 1), "no coordinates");
        return;
    }

    let name = record.text(POINT_NAME).unwrap_or_else(|| format!("Point {}", idx + 1));
    let label = record.text(POINT_TYPE).unwrap_or_else(|| name.clone());
    let id = builder.id("TAB-P", idx);
    builder.push_point(id, name, &label, (x, y));
}

fn is_origin(c: (f64, f64)) -> bool {
    c.0 == 0.0 && c.1 == 0.0
}

/// Excel and OpenDocument workbooks; only the first sheet is read
pub struct SpreadsheetImporter;

#[async_trait]
impl FormatImporter for SpreadsheetImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
            .map_err(|e| InfraTrackError::format(self.format_name(), format!("Unable to open the workbook: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| InfraTrackError::format(self.format_name(), "The workbook does not contain any worksheets"))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| InfraTrackError::format(self.format_name(), format!("Unable to read sheet '{}': {}", sheet_name, e)))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return network_from_records(&[], self.format_name(), ctx);
        };
        let headers: Vec<String> = header_row.iter().map(|c| c.to_string().trim().to_string()).collect();

        let data: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(CellValue::is_blank))
            .collect();

        let records = records_from_rows(&headers, data);
        network_from_records(&records, self.format_name(), ctx)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx", "xlsm", "xls", "ods"]
    }

    fn format_name(&self) -> &str {
        "Spreadsheet"
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::from(s.trim()),
        other => CellValue::from(other.to_string()),
    }
}

/// Comma-separated values with a header row
pub struct CsvImporter;

#[async_trait]
impl FormatImporter for CsvImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let content = content.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(content);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| InfraTrackError::format(self.format_name(), e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut data = Vec::new();
        let mut broken = 0usize;
        for (row_idx, result) in rdr.records().enumerate() {
            match result {
                Ok(record) => {
                    let row: Vec<CellValue> = record.iter().map(CellValue::from).collect();
                    if !row.iter().all(CellValue::is_blank) {
                        data.push(row);
                    }
                }
                Err(e) => {
                    // +2 for the header row and 1-based numbering
                    tracing::debug!("Skipping CSV row {}: {}", row_idx + 2, e);
                    broken += 1;
                }
            }
        }

        let records = records_from_rows(&headers, data);
        let mut outcome = network_from_records(&records, self.format_name(), ctx)?;
        outcome.report.records_seen += broken;
        outcome.report.skipped += broken;
        Ok(outcome)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }

    fn format_name(&self) -> &str {
        "CSV"
    }
}
