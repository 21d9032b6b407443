//! Shared tail of every importer: normalize coordinates, fill in lengths,
//! classify labels, mint ids and count what was kept.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::classify::{classify_point, classify_segment_network};
use crate::formats::{ImportContext, ImportOutcome, ImportReport};
use crate::error::Result;
use crate::geo::{distance_meters, CoordinateNormalizer};
use crate::models::{Coordinate, Network, NetworkPoint, PointKind, Segment};

/// Last id stamp handed out in this process
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Current time in milliseconds, bumped past the previous stamp so two
/// builders never share one even when created in the same millisecond.
fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = match LAST_STAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1))) {
        Ok(prev) | Err(prev) => prev,
    };
    now.max(prev + 1)
}

pub(crate) struct NetworkBuilder<'a> {
    ctx: &'a ImportContext,
    normalizer: CoordinateNormalizer,
    stamp: i64,
    network: Network,
    report: ImportReport,
}

/// A line as extracted from the source, coordinates still raw
pub(crate) struct RawSegment<'s> {
    pub id: String,
    pub name: String,
    /// Text fed to the network-type classifier
    pub label: &'s str,
    pub start: (f64, f64),
    pub end: (f64, f64),
    /// Length declared by the source; zero or less means "not given"
    pub declared_length: f64,
    pub contractor: String,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(format: &str, ctx: &'a ImportContext) -> Result<Self> {
        Ok(Self {
            ctx,
            normalizer: CoordinateNormalizer::for_zone(ctx.zone)?,
            stamp: next_stamp(),
            network: Network::default(),
            report: ImportReport::new(format),
        })
    }

    /// Id of the form `PREFIX-index-timestamp`
    pub fn id(&self, prefix: &str, index: impl std::fmt::Display) -> String {
        format!("{}-{}-{}", prefix, index, self.stamp)
    }

    pub fn context(&self) -> &ImportContext {
        self.ctx
    }

    /// Count a record read from the source
    pub fn seen(&mut self) {
        self.report.records_seen += 1;
    }

    /// Drop a record that has no usable geometry
    pub fn skip(&mut self, what: impl std::fmt::Display, reason: &str) {
        self.report.skipped += 1;
        tracing::debug!(format = %self.report.format, "Skipping {}: {}", what, reason);
    }

    pub fn normalize(&self, raw: (f64, f64)) -> Option<Coordinate> {
        if !raw.0.is_finite() || !raw.1.is_finite() {
            return None;
        }
        Some(self.normalizer.normalize(raw.0, raw.1))
    }

    pub fn push_segment(&mut self, raw: RawSegment<'_>) {
        let (Some(start), Some(end)) = (self.normalize(raw.start), self.normalize(raw.end)) else {
            self.skip(&raw.name, "non-numeric coordinates");
            return;
        };

        let length = if raw.declared_length.is_finite() && raw.declared_length > 0.0 {
            raw.declared_length
        } else {
            distance_meters(start, end)
        };

        let network_type = classify_segment_network(raw.label, self.ctx.network);
        self.network.segments.push(Segment::imported(
            raw.id,
            raw.name,
            network_type,
            start,
            end,
            length,
            raw.contractor,
        ));
        self.report.segments += 1;
    }

    /// Add a point, classifying `label` under the import's network context
    pub fn push_point(&mut self, id: String, name: String, label: &str, raw: (f64, f64)) {
        let kind = classify_point(label, self.ctx.network);
        self.push_point_of_kind(id, name, kind, raw);
    }

    pub fn push_point_of_kind(&mut self, id: String, name: String, kind: PointKind, raw: (f64, f64)) {
        let Some(location) = self.normalize(raw) else {
            self.skip(&name, "non-numeric coordinates");
            return;
        };
        self.network.points.push(NetworkPoint::imported(id, name, kind, location));
        self.report.points += 1;
    }

    pub fn finish(self) -> ImportOutcome {
        tracing::debug!(
            format = %self.report.format,
            seen = self.report.records_seen,
            skipped = self.report.skipped,
            "Built network"
        );
        ImportOutcome {
            network: self.network,
            report: self.report,
        }
    }
}
