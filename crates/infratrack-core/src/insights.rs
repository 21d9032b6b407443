//! Project commentary through an external text service.
//!
//! The service is best effort: whatever goes wrong, the caller gets
//! [`FALLBACK_COMMENTARY`] and the import/audit flow carries on.

use serde::Serialize;

use crate::error::Result;
use crate::models::{ExecutionStatus, NetworkType, Segment};
use crate::ports::CommentaryService;

/// Returned when the commentary service cannot be reached or fails
pub const FALLBACK_COMMENTARY: &str = "Sorry, the project data could not be analysed right now.";

const INSIGHTS_PROMPT: &str = "As an expert infrastructure engineer, analyse the following data \
for a water and sewage network project and write a short report covering:\n\
1. Overall execution status.\n\
2. Likely obstacles given the current status.\n\
3. Recommendations to improve the execution rate.";

#[derive(Debug, Serialize)]
struct SegmentSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    network_type: NetworkType,
    status: ExecutionStatus,
    progress: u8,
    length: f64,
}

/// JSON array of name/type/status/progress/length, one entry per segment
pub fn segment_summary(segments: &[Segment]) -> Result<String> {
    let summary: Vec<SegmentSummary<'_>> = segments
        .iter()
        .map(|s| SegmentSummary {
            name: &s.name,
            network_type: s.network_type,
            status: s.status,
            progress: s.completion_percentage,
            length: s.length_meters,
        })
        .collect();
    Ok(serde_json::to_string(&summary)?)
}

/// Ask the service for commentary on the project's segments
pub fn project_insights(service: &dyn CommentaryService, segments: &[Segment]) -> String {
    let generated = segment_summary(segments)
        .and_then(|summary| service.generate(INSIGHTS_PROMPT, &[summary.as_str()]));

    match generated {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::error!("Commentary service returned an empty response");
            FALLBACK_COMMENTARY.to_string()
        }
        Err(e) => {
            tracing::error!(error = %e, "Commentary service failed");
            FALLBACK_COMMENTARY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfraTrackError;
    use crate::models::Coordinate;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    impl CommentaryService for Recording {
        fn generate(&self, prompt: &str, context: &[&str]) -> Result<String> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(prompt.to_string());
            seen.extend(context.iter().map(|c| c.to_string()));
            Ok("All good".to_string())
        }
    }

    struct Offline;

    impl CommentaryService for Offline {
        fn generate(&self, _prompt: &str, _context: &[&str]) -> Result<String> {
            Err(InfraTrackError::CommentaryUnavailable("connection refused".into()))
        }
    }

    fn segments() -> Vec<Segment> {
        let mut s = Segment::imported(
            "S-1",
            "Main 1",
            NetworkType::Sewage,
            Coordinate::new(39.23, 21.60),
            Coordinate::new(39.231, 21.601),
            150.0,
            "ACME",
        );
        s.completion_percentage = 40;
        s.status = ExecutionStatus::InProgress;
        vec![s]
    }

    #[test]
    fn test_segment_summary_fields() {
        let json = segment_summary(&segments()).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"Main 1","type":"SEWAGE","status":"IN_PROGRESS","progress":40,"length":150.0}]"#
        );
        assert_eq!(segment_summary(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_summary_is_passed_as_context() {
        let service = Recording {
            seen: Mutex::new(Vec::new()),
        };
        assert_eq!(project_insights(&service, &segments()), "All good");

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("infrastructure engineer"));
        assert!(seen[1].contains("\"Main 1\""));
    }

    #[test]
    fn test_failure_degrades_to_fallback() {
        assert_eq!(project_insights(&Offline, &segments()), FALLBACK_COMMENTARY);
    }
}
