//! ASCII DXF import.
//!
//! A DXF file is a flat stream of (group code, value) line pairs. Only the
//! ENTITIES section is read; an entity ends where the next group code 0
//! begins. LINE and LWPOLYLINE become segments, POINT and INSERT become
//! points. The layer name (code 8) and the block name of an INSERT (code 2)
//! are used as the classification label.

use async_trait::async_trait;

use super::builder::{NetworkBuilder, RawSegment};
use crate::error::{InfraTrackError, Result};
use crate::formats::{FormatImporter, ImportContext, ImportOutcome};

const CONTRACTOR: &str = "DXF";
const BINARY_SENTINEL: &[u8] = b"AutoCAD Binary DXF";

pub struct DxfImporter;

/// Entity being accumulated between two code-0 boundaries
#[derive(Debug, Default)]
struct PendingEntity {
    kind: String,
    layer: String,
    block: String,
    first: (Option<f64>, Option<f64>),
    second: (Option<f64>, Option<f64>),
    vertices: Vec<(f64, f64)>,
}

impl PendingEntity {
    fn start(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    fn is_point_like(&self) -> bool {
        self.kind == "POINT" || self.kind == "INSERT"
    }

    fn collect(&mut self, code: &str, value: &str) {
        match code {
            "8" => self.layer = value.to_string(),
            "2" if self.kind == "INSERT" => self.block = value.to_string(),
            _ => {}
        }

        let number = || value.parse::<f64>().unwrap_or(f64::NAN);
        match self.kind.as_str() {
            "LINE" => match code {
                "10" => self.first.0 = Some(number()),
                "20" => self.first.1 = Some(number()),
                "11" => self.second.0 = Some(number()),
                "21" => self.second.1 = Some(number()),
                _ => {}
            },
            "LWPOLYLINE" => match code {
                "10" => self.vertices.push((number(), 0.0)),
                "20" => {
                    if let Some(last) = self.vertices.last_mut() {
                        last.1 = number();
                    }
                }
                _ => {}
            },
            "POINT" | "INSERT" => match code {
                "10" => self.first.0 = Some(number()),
                "20" => self.first.1 = Some(number()),
                _ => {}
            },
            _ => {}
        }
    }
}

struct DxfParser<'a> {
    builder: NetworkBuilder<'a>,
    segment_count: usize,
    point_count: usize,
}

impl<'a> DxfParser<'a> {
    fn finalize(&mut self, entity: PendingEntity) {
        match entity.kind.as_str() {
            "LINE" => {
                self.builder.seen();
                let (Some(x1), Some(y1)) = entity.first else {
                    self.builder.skip("LINE", "no start point");
                    return;
                };
                let n = self.segment_count;
                let id = self.builder.id("DXF-L", n);
                self.builder.push_segment(RawSegment {
                    id,
                    name: format!("DXF Line {}", n),
                    label: &entity.layer,
                    start: (x1, y1),
                    end: (entity.second.0.unwrap_or(f64::NAN), entity.second.1.unwrap_or(f64::NAN)),
                    declared_length: 0.0,
                    contractor: CONTRACTOR.to_string(),
                });
                self.segment_count += 1;
            }
            "LWPOLYLINE" => {
                self.builder.seen();
                if entity.vertices.len() < 2 {
                    self.builder.skip("LWPOLYLINE", "fewer than two vertices");
                    return;
                }
                let base = self.segment_count;
                for (v, pair) in entity.vertices.windows(2).enumerate() {
                    let id = self.builder.id("DXF-PL", format!("{}-{}", base, v));
                    self.builder.push_segment(RawSegment {
                        id,
                        name: format!("Polyline Seg {}", v),
                        label: &entity.layer,
                        start: pair[0],
                        end: pair[1],
                        declared_length: 0.0,
                        contractor: CONTRACTOR.to_string(),
                    });
                    self.segment_count += 1;
                }
            }
            _ if entity.is_point_like() => {
                self.builder.seen();
                let Some(x) = entity.first.0 else {
                    self.builder.skip(&entity.kind, "no insertion point");
                    return;
                };
                let n = self.point_count;
                let id = self.builder.id("DXF-P", n);
                let label = format!("{} {}", entity.block, entity.layer);
                self.builder.push_point(
                    id,
                    format!("DXF Point {}", n),
                    label.trim(),
                    (x, entity.first.1.unwrap_or(f64::NAN)),
                );
                self.point_count += 1;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl FormatImporter for DxfImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        if content.starts_with(BINARY_SENTINEL) {
            return Err(InfraTrackError::format(self.format_name(), "binary DXF is not supported, export as ASCII"));
        }

        let text = String::from_utf8_lossy(content);
        let mut lines = text.lines();

        let mut parser = DxfParser {
            builder: NetworkBuilder::new(self.format_name(), ctx)?,
            segment_count: 0,
            point_count: 0,
        };
        let mut section = String::new();
        let mut saw_section = false;
        let mut pending: Option<PendingEntity> = None;

        while let Some(code) = lines.next() {
            let code = code.trim();
            let value = lines.next().map(str::trim).unwrap_or("");

            if code == "0" && value == "SECTION" {
                saw_section = true;
                section.clear();
                continue;
            }
            if code == "2" && section.is_empty() {
                section = value.to_string();
                continue;
            }
            if section != "ENTITIES" {
                continue;
            }

            if code == "0" {
                if let Some(done) = pending.take() {
                    parser.finalize(done);
                }
                if value == "ENDSEC" {
                    section.clear();
                    continue;
                }
                pending = Some(PendingEntity::start(value));
            } else if let Some(entity) = pending.as_mut() {
                entity.collect(code, value);
            }
        }

        // Truncated file: keep whatever was complete
        if let Some(done) = pending.take() {
            parser.finalize(done);
        }

        if !saw_section {
            return Err(InfraTrackError::format(self.format_name(), "no SECTION found, not a DXF file"));
        }

        Ok(parser.builder.finish())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["dxf"]
    }

    fn format_name(&self) -> &str {
        "DXF"
    }
}
