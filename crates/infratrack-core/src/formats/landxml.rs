//! LandXML import (Civil 3D pipe networks).
//!
//! `Pipe` elements become segments and `Struct` elements become points.
//! Coordinates are "northing easting [elevation]" text, comma or whitespace
//! separated. A pipe without `Start`/`End` children falls back to the
//! centers of the structures named by its `refStart`/`refEnd` attributes.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use super::builder::{NetworkBuilder, RawSegment};
use crate::error::{InfraTrackError, Result};
use crate::formats::{FormatImporter, ImportContext, ImportOutcome};

const CONTRACTOR: &str = "Civil 3D";

pub struct LandXmlImporter;

#[derive(Debug, Default)]
struct PipeElement {
    name: Option<String>,
    desc: String,
    network: String,
    ref_start: Option<String>,
    ref_end: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default)]
struct StructElement {
    name: Option<String>,
    desc: String,
    center: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Capture {
    None,
    Start,
    End,
    Center,
}

/// Parse "northing easting [z]" into an (x, y) pair
fn parse_northing_easting(text: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = text
        .replace(',', " ")
        .split_whitespace()
        .map(|p| p.parse::<f64>().unwrap_or(f64::NAN))
        .collect();
    match parts.as_slice() {
        [northing, easting, ..] => Some((*easting, *northing)),
        _ => None,
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

fn read_elements(content: &[u8]) -> Result<(Vec<PipeElement>, Vec<StructElement>)> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut pipes = Vec::new();
    let mut structs = Vec::new();
    let mut pipe: Option<PipeElement> = None;
    let mut structure: Option<StructElement> = None;
    let mut network_type = String::new();
    let mut capture = Capture::None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            InfraTrackError::format(
                "LandXML",
                format!("XML error at byte {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"PipeNetwork" => network_type = attribute(&e, b"pipeNetType").unwrap_or_default(),
                b"Pipe" => {
                    pipe = Some(PipeElement {
                        name: attribute(&e, b"name"),
                        desc: attribute(&e, b"desc").unwrap_or_default(),
                        network: network_type.clone(),
                        ref_start: attribute(&e, b"refStart"),
                        ref_end: attribute(&e, b"refEnd"),
                        ..Default::default()
                    })
                }
                b"Struct" => {
                    structure = Some(StructElement {
                        name: attribute(&e, b"name"),
                        desc: attribute(&e, b"desc").unwrap_or_default(),
                        center: None,
                    })
                }
                b"Start" if pipe.is_some() => capture = Capture::Start,
                b"End" if pipe.is_some() => capture = Capture::End,
                b"Center" if structure.is_some() => capture = Capture::Center,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"Pipe" => pipes.push(PipeElement {
                    name: attribute(&e, b"name"),
                    desc: attribute(&e, b"desc").unwrap_or_default(),
                    network: network_type.clone(),
                    ref_start: attribute(&e, b"refStart"),
                    ref_end: attribute(&e, b"refEnd"),
                    ..Default::default()
                }),
                b"Struct" => structs.push(StructElement {
                    name: attribute(&e, b"name"),
                    desc: attribute(&e, b"desc").unwrap_or_default(),
                    center: None,
                }),
                _ => {}
            },
            Event::Text(t) if capture != Capture::None => {
                let chunk = t
                    .unescape()
                    .map_err(|e| InfraTrackError::format("LandXML", e))?;
                text.push_str(&chunk);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Start" | b"End" | b"Center" if capture != Capture::None => {
                    let value = std::mem::take(&mut text);
                    match capture {
                        Capture::Start => pipe.iter_mut().for_each(|p| p.start = Some(value.clone())),
                        Capture::End => pipe.iter_mut().for_each(|p| p.end = Some(value.clone())),
                        Capture::Center => structure.iter_mut().for_each(|s| s.center = Some(value.clone())),
                        Capture::None => {}
                    }
                    capture = Capture::None;
                }
                b"Pipe" => pipes.extend(pipe.take()),
                b"Struct" => structs.extend(structure.take()),
                b"PipeNetwork" => network_type.clear(),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((pipes, structs))
}

#[async_trait]
impl FormatImporter for LandXmlImporter {
    fn import(&self, content: &[u8], ctx: &ImportContext) -> Result<ImportOutcome> {
        let (pipes, structs) = read_elements(content)?;
        let mut builder = NetworkBuilder::new(self.format_name(), ctx)?;

        let centers: HashMap<&str, (f64, f64)> = structs
            .iter()
            .filter_map(|s| {
                let name = s.name.as_deref()?;
                let center = parse_northing_easting(s.center.as_deref()?)?;
                Some((name, center))
            })
            .collect();

        let resolve = |text: &Option<String>, reference: &Option<String>| {
            text.as_deref()
                .and_then(parse_northing_easting)
                .or_else(|| reference.as_deref().and_then(|r| centers.get(r).copied()))
        };

        for (i, pipe) in pipes.iter().enumerate() {
            builder.seen();
            let name = pipe.name.clone().unwrap_or_else(|| format!("C3D-Pipe-{}", i));
            let (Some(start), Some(end)) = (
                resolve(&pipe.start, &pipe.ref_start),
                resolve(&pipe.end, &pipe.ref_end),
            ) else {
                builder.skip(&name, "no start/end coordinates");
                continue;
            };
            let label = format!("{} {} {}", pipe.network, pipe.desc, name);
            let id = builder.id("C3D-S", i);
            builder.push_segment(RawSegment {
                id,
                name,
                label: &label,
                start,
                end,
                declared_length: 0.0,
                contractor: CONTRACTOR.to_string(),
            });
        }

        for (i, st) in structs.iter().enumerate() {
            builder.seen();
            let name = st.name.clone().unwrap_or_else(|| format!("C3D-MH-{}", i));
            let Some(center) = st.center.as_deref().and_then(parse_northing_easting) else {
                builder.skip(&name, "no center");
                continue;
            };
            let label = format!("{} {}", st.desc, name);
            let id = builder.id("C3D-P", i);
            builder.push_point(id, name, label.trim(), center);
        }

        Ok(builder.finish())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xml", "landxml"]
    }

    fn format_name(&self) -> &str {
        "LandXML"
    }

    async fn validate(&self, path: &std::path::Path) -> Result<crate::formats::FormatValidation> {
        let content = tokio::fs::read(path).await?;
        Ok(crate::formats::FormatValidator::validate_xml_structure(&content))
    }
}
